use crate::{GnucashError, Result};
use indexmap::{Equivalent, IndexMap};
use uuid::Uuid;

use std::hash::Hash;

macro_rules! node_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the node in its book collection.
            pub fn index(&self) -> usize {
                self.0
            }
        }
    };
}

node_id!(
    /// Handle of a [`Commodity`][crate::Commodity] within its book.
    CommodityId
);
node_id!(
    /// Handle of an [`Account`][crate::Account] within its book.
    AccountId
);
node_id!(
    /// Handle of a [`Transaction`][crate::Transaction] within its book.
    TransactionId
);
node_id!(
    /// Handle of a [`Price`][crate::Price] within its book.
    PriceId
);

/// A split is addressed by its transaction and its position in it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SplitId {
    pub transaction: TransactionId,
    pub position: usize,
}

/// Append-only identity-key to node map. The first registration of a key wins.
#[derive(Clone, Debug)]
pub struct Index<K, V> {
    entries: IndexMap<K, V>,
}

impl<K: Hash + Eq, V: Copy> Index<K, V> {
    pub fn new() -> Self {
        Index {
            entries: IndexMap::new(),
        }
    }

    /// Registers `node` under `key` unless the key is taken, and returns
    /// whichever node now owns the key.
    pub fn register(&mut self, key: K, node: V) -> V {
        *self.entries.entry(key).or_insert(node)
    }

    pub fn resolve<Q: ?Sized + Hash + Equivalent<K>>(&self, key: &Q) -> Option<V> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registrations in the order they were first made.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }
}

impl<K: Hash + Eq, V: Copy> Default for Index<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

const COMMODITY_NAMESPACE: Uuid = Uuid::from_u128(0x6a1f_4c2e_9d7b_5e10_8c3a_2b4f_0e6d_91a7);

/// Synthesized identity of a commodity, which carries no GUID of its own.
///
/// Each part is length-prefixed so that no two distinct pairs hash the same
/// input, e.g. (`A:B`, `C`) and (`A`, `B:C`).
pub fn commodity_key(space: &str, symbol: &str) -> Uuid {
    let name = format!("{}:{}/{}:{}", space.len(), space, symbol.len(), symbol);
    Uuid::new_v5(&COMMODITY_NAMESPACE, name.as_bytes())
}

/// The per-book lookup tables: accounts and transactions by GUID, commodities
/// by synthesized key.
#[derive(Clone, Debug, Default)]
pub struct CrossRef {
    pub(crate) accounts: Index<String, AccountId>,
    pub(crate) transactions: Index<String, TransactionId>,
    pub(crate) commodities: Index<Uuid, CommodityId>,
}

impl CrossRef {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn account(&self, guid: &str) -> Option<AccountId> {
        self.accounts.resolve(guid)
    }

    pub fn transaction(&self, guid: &str) -> Option<TransactionId> {
        self.transactions.resolve(guid)
    }

    pub fn commodity(&self, space: &str, symbol: &str) -> Option<CommodityId> {
        self.commodities.resolve(&commodity_key(space, symbol))
    }

    /// Resolves a declared account reference; a miss is a [`GnucashError::Reference`].
    pub fn resolve_account(&self, guid: &str) -> Result<AccountId> {
        self.account(guid).ok_or_else(|| GnucashError::Reference {
            kind: "account",
            key: guid.to_string(),
        })
    }

    /// Resolves a declared commodity reference; a miss is a [`GnucashError::Reference`].
    pub fn resolve_commodity(&self, space: &str, symbol: &str) -> Result<CommodityId> {
        self.commodity(space, symbol)
            .ok_or_else(|| GnucashError::Reference {
                kind: "commodity",
                key: format!("{}:{}", space, symbol),
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::index::{commodity_key, AccountId, CommodityId, CrossRef, Index};
    use crate::GnucashError;

    use anyhow::Result;

    #[test]
    fn first_registration_wins() {
        let mut index: Index<String, AccountId> = Index::new();
        assert_eq!(index.register("a1".into(), AccountId(0)), AccountId(0));
        assert_eq!(index.register("a2".into(), AccountId(1)), AccountId(1));
        assert_eq!(index.register("a1".into(), AccountId(2)), AccountId(0));

        assert_eq!(index.len(), 2);
        assert_eq!(index.resolve("a1"), Some(AccountId(0)));
        assert_eq!(index.resolve("a3"), None);
        assert_eq!(
            index.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            vec!["a1", "a2"]
        );
    }

    #[test]
    fn commodity_keys_are_stable_and_distinct() {
        assert_eq!(
            commodity_key("CURRENCY", "EUR"),
            commodity_key("CURRENCY", "EUR")
        );
        assert_ne!(
            commodity_key("CURRENCY", "EUR"),
            commodity_key("CURRENCY", "USD")
        );
        assert_ne!(commodity_key("A:B", "C"), commodity_key("A", "B:C"));
    }

    #[test]
    fn resolve_misses_are_reference_errors() -> Result<()> {
        let mut xref = CrossRef::new();
        xref.commodities
            .register(commodity_key("NASDAQ", "AAPL"), CommodityId(0));
        assert_eq!(xref.resolve_commodity("NASDAQ", "AAPL")?, CommodityId(0));

        match xref.resolve_commodity("NYSE", "AAPL") {
            Err(GnucashError::Reference { kind, key }) => {
                assert_eq!(kind, "commodity");
                assert_eq!(key, "NYSE:AAPL");
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(
            xref.resolve_account("deadbeef").unwrap_err().to_string(),
            "unresolved account reference `deadbeef'"
        );
        Ok(())
    }
}
