use crate::account::Account;
use crate::commodity::Commodity;
use crate::index::{AccountId, CommodityId, CrossRef, PriceId, SplitId, TransactionId};
use crate::price::Price;
use crate::slot::Slot;
use crate::transaction::{Split, Transaction};
use crate::walk::{AccountSplits, Children, Walk};

/// One decoded GnuCash book.
///
/// Every handle stored in a node ([`AccountId`], [`CommodityId`], ...) points
/// back into this book. The book is immutable once decoded; relational lookups
/// (children, splits, full names) are answered from lists built at decode time.
///
/// Nodes are only meaningful to the book that decoded them. Accessors taking
/// a node return `None` when its handle is out of range for this book, but a
/// node from another book whose handle happens to be in range is answered as
/// if it were this book's node at that position.
#[derive(Clone, Debug)]
pub struct Book {
    pub(crate) guid: String,
    pub(crate) slots: Vec<Slot>,
    pub(crate) commodities: Vec<Commodity>,
    pub(crate) accounts: Vec<Account>,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) prices: Vec<Price>,
    pub(crate) root: AccountId,
    pub(crate) index: CrossRef,
    /// Per account, the accounts whose parent it is, in document order.
    pub(crate) children: Vec<Vec<AccountId>>,
    /// Per account, the splits posted to it, in document order.
    pub(crate) postings: Vec<Vec<SplitId>>,
}

impl Book {
    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn commodities(&self) -> &[Commodity] {
        &self.commodities
    }

    /// All accounts in document order, the root included.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn prices(&self) -> &[Price] {
        &self.prices
    }

    /// The single `ROOT` account of the chart of accounts.
    pub fn root_account(&self) -> &Account {
        &self.accounts[self.root.0]
    }

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(id.0)
    }

    pub fn commodity(&self, id: CommodityId) -> Option<&Commodity> {
        self.commodities.get(id.0)
    }

    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(id.0)
    }

    pub fn split(&self, id: SplitId) -> Option<&Split> {
        self.transaction(id.transaction)?.splits.get(id.position)
    }

    pub fn price(&self, id: PriceId) -> Option<&Price> {
        self.prices.get(id.0)
    }

    pub fn account_by_guid(&self, guid: &str) -> Option<&Account> {
        self.account(self.index.account(guid)?)
    }

    pub fn transaction_by_guid(&self, guid: &str) -> Option<&Transaction> {
        self.transaction(self.index.transaction(guid)?)
    }

    /// Looks a commodity up by its identity pair, e.g. `("CURRENCY", "EUR")`.
    pub fn commodity_by_symbol(&self, space: &str, symbol: &str) -> Option<&Commodity> {
        self.commodity(self.index.commodity(space, symbol)?)
    }

    /// `None` only for the root account.
    pub fn parent(&self, account: &Account) -> Option<&Account> {
        self.account(account.parent?)
    }

    pub fn children(&self, account: &Account) -> Option<Children<'_>> {
        let ids = self.children.get(account.id.0)?;
        Some(Children::new(self, ids))
    }

    pub fn splits(&self, account: &Account) -> Option<AccountSplits<'_>> {
        let ids = self.postings.get(account.id.0)?;
        Some(AccountSplits::new(self, ids))
    }

    /// Colon-joined account names from the top of the tree down to `account`.
    ///
    /// The root itself is nameless here: its full name is the empty string
    /// and a top-level account's full name is just its own name.
    pub fn fullname(&self, account: &Account) -> String {
        let mut names = Vec::new();
        let mut current = account;
        while let Some(parent) = self.parent(current) {
            names.push(current.name.as_str());
            current = parent;
        }
        names.reverse();
        names.join(":")
    }

    pub fn commodity_of(&self, account: &Account) -> Option<&Commodity> {
        self.commodity(account.commodity?)
    }

    pub fn transaction_of(&self, split: &Split) -> Option<&Transaction> {
        self.transaction(split.transaction)
    }

    pub fn account_of(&self, split: &Split) -> Option<&Account> {
        self.account(split.account)
    }

    /// Breadth-first walk over the whole account tree.
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(self, self.root)
    }

    /// Breadth-first walk over the subtree rooted at `account`.
    pub fn walk_from(&self, account: &Account) -> Walk<'_> {
        Walk::new(self, account.id)
    }

    pub fn index(&self) -> &CrossRef {
        &self.index
    }
}
