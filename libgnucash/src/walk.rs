use crate::account::Account;
use crate::book::Book;
use crate::index::{AccountId, SplitId};
use crate::transaction::Split;

use std::collections::VecDeque;

/// Read-only view over the direct children of an account.
#[derive(Clone, Copy, Debug)]
pub struct Children<'b> {
    book: &'b Book,
    ids: &'b [AccountId],
}

impl<'b> Children<'b> {
    pub(crate) fn new(book: &'b Book, ids: &'b [AccountId]) -> Self {
        Children { book, ids }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'b Account> + 'b {
        let (book, ids) = (self.book, self.ids);
        ids.iter().map(move |id| &book.accounts[id.0])
    }

    pub fn ids(&self) -> &'b [AccountId] {
        self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Read-only view over the splits posted to an account.
#[derive(Clone, Copy, Debug)]
pub struct AccountSplits<'b> {
    book: &'b Book,
    ids: &'b [SplitId],
}

impl<'b> AccountSplits<'b> {
    pub(crate) fn new(book: &'b Book, ids: &'b [SplitId]) -> Self {
        AccountSplits { book, ids }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'b Split> + 'b {
        let (book, ids) = (self.book, self.ids);
        ids.iter()
            .map(move |id| &book.transactions[id.transaction.0].splits[id.position])
    }

    pub fn ids(&self) -> &'b [SplitId] {
        self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Breadth-first traversal yielding `(account, children, splits)`.
///
/// Starts at the account it was created for and visits every account below
/// it exactly once. [`Walk::restart`] rewinds it.
#[derive(Clone, Debug)]
pub struct Walk<'b> {
    book: &'b Book,
    start: AccountId,
    queue: VecDeque<AccountId>,
}

impl<'b> Walk<'b> {
    pub(crate) fn new(book: &'b Book, start: AccountId) -> Self {
        Walk {
            book,
            start,
            queue: VecDeque::from([start]),
        }
    }

    pub fn restart(&mut self) {
        self.queue.clear();
        self.queue.push_back(self.start);
    }
}

impl<'b> Iterator for Walk<'b> {
    type Item = (&'b Account, Children<'b>, AccountSplits<'b>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.queue.pop_front()?;
        let account = self.book.account(id)?;
        let children = self.book.children(account)?;
        self.queue.extend(children.ids());
        Some((account, children, self.book.splits(account)?))
    }
}
