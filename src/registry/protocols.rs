//! Built-in protocol registry.
//!
//! Sources without a URL are placeholders: the published feed is either
//! unknown or known to be broken (HTML served at the feed path, 404, ...).
//! `chainfeeds discover` probes these.

use super::model::{Category, Protocol, Source, SourceType};

use super::model::SourceType::{Blog, Forum, Governance, Research, Security};

pub static PROTOCOLS: &[Protocol] = &[
    // L1
    Protocol {
        name: "Ethereum",
        slug: "ethereum",
        homepage: "https://ethereum.org",
        category: Category::L1,
        sources: &[
            Source::url(Blog, "https://blog.ethereum.org/feed.xml"),
            Source::github("ethereum/go-ethereum"),
            Source::url(Forum, "https://ethresear.ch"),
            Source::url(Governance, "https://ethereum-magicians.org"),
        ],
    },
    Protocol {
        name: "Solana",
        slug: "solana",
        homepage: "https://solana.com",
        category: Category::L1,
        sources: &[
            Source::unknown(Blog),
            Source::github("solana-labs/solana"),
        ],
    },
    Protocol {
        name: "Avalanche",
        slug: "avalanche",
        homepage: "https://www.avax.network",
        category: Category::L1,
        sources: &[
            Source::url(Blog, "https://medium.com/feed/avalancheavax"),
            Source::github("ava-labs/avalanchego"),
        ],
    },
    Protocol {
        name: "Cosmos",
        slug: "cosmos",
        homepage: "https://cosmos.network",
        category: Category::L1,
        sources: &[
            Source::url(Blog, "https://blog.cosmos.network/feed"),
            Source::github("cosmos/cosmos-sdk"),
            Source::url(Forum, "https://forum.cosmos.network"),
        ],
    },
    Protocol {
        name: "Polkadot",
        slug: "polkadot",
        homepage: "https://polkadot.com",
        category: Category::L1,
        sources: &[
            Source::url(Blog, "https://medium.com/feed/polkadot-network"),
            Source::github("polkadot-fellows/runtimes"),
        ],
    },
    Protocol {
        name: "Sui",
        slug: "sui",
        homepage: "https://sui.io",
        category: Category::L1,
        sources: &[
            Source::url(Blog, "https://blog.sui.io/rss/"),
            Source::github("MystenLabs/sui"),
        ],
    },
    Protocol {
        name: "Aptos",
        slug: "aptos",
        homepage: "https://aptosfoundation.org",
        category: Category::L1,
        sources: &[
            Source::url(Blog, "https://medium.com/feed/aptoslabs"),
            Source::github("aptos-labs/aptos-core"),
        ],
    },
    Protocol {
        name: "NEAR",
        slug: "near",
        homepage: "https://near.org",
        category: Category::L1,
        sources: &[
            Source::url(Blog, "https://medium.com/feed/nearprotocol"),
            Source::github("near/nearcore"),
        ],
    },
    Protocol {
        name: "Algorand",
        slug: "algorand",
        homepage: "https://algorand.co",
        category: Category::L1,
        sources: &[
            Source::url(Blog, "https://algorand.co/blog/rss.xml"),
            Source::github("algorand/go-algorand"),
        ],
    },
    // L2
    Protocol {
        name: "Arbitrum",
        slug: "arbitrum",
        homepage: "https://arbitrum.io",
        category: Category::L2,
        sources: &[
            Source::url(Blog, "https://offchain.medium.com/feed"),
            Source::github("OffchainLabs/nitro"),
            Source::url(Governance, "https://forum.arbitrum.foundation"),
        ],
    },
    Protocol {
        name: "Optimism",
        slug: "optimism",
        homepage: "https://optimism.io",
        category: Category::L2,
        sources: &[
            Source::url(Blog, "https://blog.optimism.io/rss/"),
            Source::github("ethereum-optimism/optimism"),
            Source::url(Governance, "https://gov.optimism.io"),
        ],
    },
    Protocol {
        name: "Base",
        slug: "base",
        homepage: "https://base.org",
        category: Category::L2,
        sources: &[Source::unknown(Blog), Source::github("base-org/node")],
    },
    Protocol {
        name: "zkSync",
        slug: "zksync",
        homepage: "https://zksync.io",
        category: Category::L2,
        sources: &[
            Source::url(Blog, "https://blog.matter-labs.io/feed"),
            Source::github("matter-labs/zksync-era"),
        ],
    },
    Protocol {
        name: "StarkNet",
        slug: "starknet",
        homepage: "https://starknet.io",
        category: Category::L2,
        sources: &[
            // starknet.io/blog/feed/ serves HTML
            Source::unknown(Blog),
            Source::github("starkware-libs/cairo"),
            Source::url(Forum, "https://community.starknet.io"),
        ],
    },
    Protocol {
        name: "Polygon",
        slug: "polygon",
        homepage: "https://polygon.technology",
        category: Category::L2,
        sources: &[
            // blog.polygon.technology/feed/ serves HTML
            Source::unknown(Blog),
            Source::github("0xPolygon/polygon-edge"),
        ],
    },
    Protocol {
        name: "Scroll",
        slug: "scroll",
        homepage: "https://scroll.io",
        category: Category::L2,
        sources: &[
            // scroll.io/blog/feed serves HTML
            Source::unknown(Blog),
            Source::github("scroll-tech/scroll"),
        ],
    },
    // DeFi
    Protocol {
        name: "Uniswap",
        slug: "uniswap",
        homepage: "https://uniswap.org",
        category: Category::DeFi,
        sources: &[
            // blog.uniswap.org/rss.xml is a 404
            Source::unknown(Blog),
            Source::github("Uniswap/v4-core"),
            Source::url(Governance, "https://gov.uniswap.org"),
        ],
    },
    Protocol {
        name: "Aave",
        slug: "aave",
        homepage: "https://aave.com",
        category: Category::DeFi,
        sources: &[
            Source::unknown(Blog),
            Source::github("aave/aave-v3-core"),
            Source::url(Governance, "https://governance.aave.com"),
        ],
    },
    Protocol {
        name: "MakerDAO",
        slug: "makerdao",
        homepage: "https://makerdao.com",
        category: Category::DeFi,
        sources: &[
            // blog.makerdao.com/feed/ serves HTML
            Source::unknown(Blog),
            Source::url(Governance, "https://forum.makerdao.com"),
        ],
    },
    Protocol {
        name: "Compound",
        slug: "compound",
        homepage: "https://compound.finance",
        category: Category::DeFi,
        sources: &[
            Source::url(Blog, "https://medium.com/feed/compound-finance"),
            Source::github("compound-finance/compound-protocol"),
            Source::url(Governance, "https://comp.xyz"),
        ],
    },
    Protocol {
        name: "Synthetix",
        slug: "synthetix",
        homepage: "https://synthetix.io",
        category: Category::DeFi,
        sources: &[
            Source::url(Blog, "https://blog.synthetix.io/rss/"),
            Source::github("Synthetixio/synthetix"),
        ],
    },
    Protocol {
        name: "Lido",
        slug: "lido",
        homepage: "https://lido.fi",
        category: Category::DeFi,
        sources: &[
            Source::url(Blog, "https://blog.lido.fi/rss/"),
            Source::github("lidofinance/lido-dao"),
            Source::url(Research, "https://research.lido.fi/latest.rss"),
        ],
    },
    Protocol {
        name: "Curve",
        slug: "curve",
        homepage: "https://curve.fi",
        category: Category::DeFi,
        sources: &[
            Source::unknown(Blog),
            Source::github("curvefi/curve-contract"),
        ],
    },
    Protocol {
        name: "Rocket Pool",
        slug: "rocket-pool",
        homepage: "https://rocketpool.net",
        category: Category::DeFi,
        sources: &[
            Source::url(Blog, "https://medium.com/feed/rocket-pool"),
            Source::github("rocket-pool/rocketpool"),
        ],
    },
    // Infrastructure
    Protocol {
        name: "Chainlink",
        slug: "chainlink",
        homepage: "https://chain.link",
        category: Category::Infrastructure,
        sources: &[
            Source::url(Blog, "https://blog.chain.link/rss/"),
            Source::github("smartcontractkit/chainlink"),
        ],
    },
    Protocol {
        name: "The Graph",
        slug: "the-graph",
        homepage: "https://thegraph.com",
        category: Category::Infrastructure,
        sources: &[
            // thegraph.com/blog/rss.xml is a 404
            Source::unknown(Blog),
            Source::github("graphprotocol/graph-node"),
            Source::url(Forum, "https://forum.thegraph.com"),
        ],
    },
    Protocol {
        name: "Celestia",
        slug: "celestia",
        homepage: "https://celestia.org",
        category: Category::Infrastructure,
        sources: &[
            Source::url(Blog, "https://blog.celestia.org/rss/"),
            Source::github("celestiaorg/celestia-node"),
        ],
    },
    Protocol {
        name: "EigenLayer",
        slug: "eigenlayer",
        homepage: "https://eigenlayer.xyz",
        category: Category::Infrastructure,
        sources: &[
            Source::url(Blog, "https://www.blog.eigenlayer.xyz/rss/"),
            Source::github("Layr-Labs/eigenlayer-contracts"),
            Source::url(Forum, "https://forum.eigenlayer.xyz"),
        ],
    },
    Protocol {
        name: "OpenZeppelin",
        slug: "openzeppelin",
        homepage: "https://www.openzeppelin.com",
        category: Category::Infrastructure,
        sources: &[
            Source::url(Blog, "https://blog.openzeppelin.com/rss.xml"),
            Source::github("OpenZeppelin/openzeppelin-contracts"),
            // security-audits/rss.xml is a 404
            Source::unknown(Security),
        ],
    },
    Protocol {
        name: "Flashbots",
        slug: "flashbots",
        homepage: "https://www.flashbots.net",
        category: Category::Infrastructure,
        sources: &[
            Source::url(Blog, "https://writings.flashbots.net/rss.xml"),
            Source::github("flashbots/mev-boost"),
            Source::url(Forum, "https://collective.flashbots.net"),
        ],
    },
    Protocol {
        name: "IPFS",
        slug: "ipfs",
        homepage: "https://ipfs.tech",
        category: Category::Infrastructure,
        sources: &[
            Source::url(Blog, "https://blog.ipfs.io/index.xml"),
            Source::github("ipfs/kubo"),
        ],
    },
    // Privacy
    Protocol {
        name: "Zcash",
        slug: "zcash",
        homepage: "https://z.cash",
        category: Category::Privacy,
        sources: &[
            Source::url(Blog, "https://electriccoin.co/feed/"),
            Source::github("zcash/zcash"),
        ],
    },
    Protocol {
        name: "Brave",
        slug: "brave",
        homepage: "https://brave.com",
        category: Category::Privacy,
        sources: &[Source::url(Blog, "https://brave.com/blog/index.xml")],
    },
];

/// Looks up a built-in protocol by slug.
pub fn find(slug: &str) -> Option<&'static Protocol> {
    PROTOCOLS.iter().find(|p| p.slug == slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slugs_are_unique() {
        let mut seen = HashSet::new();
        for p in PROTOCOLS {
            assert!(seen.insert(p.slug), "duplicate slug: {}", p.slug);
        }
    }

    #[test]
    fn test_github_sources_use_org_repo_form() {
        for p in PROTOCOLS {
            for s in p.sources.iter().filter(|s| s.kind == SourceType::Github) {
                let repo = s.repo.unwrap_or_default();
                assert_eq!(repo.split('/').count(), 2, "{}: bad repo {repo:?}", p.name);
            }
        }
    }

    #[test]
    fn test_find_by_slug() {
        assert_eq!(find("rocket-pool").map(|p| p.name), Some("Rocket Pool"));
        assert!(find("not-a-protocol").is_none());
    }
}
