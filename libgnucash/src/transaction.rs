use crate::amount::Numeric;
use crate::commodity::CommodityRef;
use crate::date::parse_date;
use crate::index::{AccountId, CommodityId, SplitId, TransactionId};
use crate::slot::{self, Slot};
use crate::xml::{Element, Ns, Tag};
use crate::{GnucashError, Result};
use chrono::{DateTime, FixedOffset};

use std::fmt;

const TRN_ID: Tag = Tag::new(Ns::Trn, "id");
const TRN_NUM: Tag = Tag::new(Ns::Trn, "num");
const TRN_CURRENCY: Tag = Tag::new(Ns::Trn, "currency");
const TRN_DATE_POSTED: Tag = Tag::new(Ns::Trn, "date-posted");
const TRN_DATE_ENTERED: Tag = Tag::new(Ns::Trn, "date-entered");
const TRN_DESCRIPTION: Tag = Tag::new(Ns::Trn, "description");
const TRN_SLOTS: Tag = Tag::new(Ns::Trn, "slots");
const TRN_SPLITS: Tag = Tag::new(Ns::Trn, "splits");
const TRN_SPLIT: Tag = Tag::new(Ns::Trn, "split");

const SPLIT_ID: Tag = Tag::new(Ns::Split, "id");
const SPLIT_MEMO: Tag = Tag::new(Ns::Split, "memo");
const SPLIT_ACTION: Tag = Tag::new(Ns::Split, "action");
const SPLIT_RECONCILED_STATE: Tag = Tag::new(Ns::Split, "reconciled-state");
const SPLIT_RECONCILE_DATE: Tag = Tag::new(Ns::Split, "reconcile-date");
const SPLIT_VALUE: Tag = Tag::new(Ns::Split, "value");
const SPLIT_QUANTITY: Tag = Tag::new(Ns::Split, "quantity");
const SPLIT_ACCOUNT: Tag = Tag::new(Ns::Split, "account");
const SPLIT_SLOTS: Tag = Tag::new(Ns::Split, "slots");

const TS_DATE: Tag = Tag::new(Ns::Ts, "date");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileState {
    New,        // 'n'
    Cleared,    // 'c'
    Reconciled, // 'y'
    Frozen,     // 'f'
    Voided,     // 'v'
}

impl TryFrom<&str> for ReconcileState {
    type Error = GnucashError;

    fn try_from(s: &str) -> Result<Self> {
        match s.trim() {
            "n" => Ok(ReconcileState::New),
            "c" => Ok(ReconcileState::Cleared),
            "y" => Ok(ReconcileState::Reconciled),
            "f" => Ok(ReconcileState::Frozen),
            "v" => Ok(ReconcileState::Voided),
            _ => Err(crate::format_err(format!(
                "input `{}' is not a valid reconciliation state",
                s
            ))),
        }
    }
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            ReconcileState::New => "n",
            ReconcileState::Cleared => "c",
            ReconcileState::Reconciled => "y",
            ReconcileState::Frozen => "f",
            ReconcileState::Voided => "v",
        };
        f.write_str(c)
    }
}

/// One posting of a transaction against one account.
#[derive(Clone, Debug, PartialEq)]
pub struct Split {
    pub id: SplitId,
    pub guid: String,
    pub transaction: TransactionId,
    pub account: AccountId,
    pub memo: Option<String>,
    pub action: Option<String>,
    pub reconciled_state: ReconcileState,
    pub reconcile_date: Option<DateTime<FixedOffset>>,
    pub value: Numeric,
    pub quantity: Numeric,
    pub slots: Vec<Slot>,
}

/// A dated group of splits whose values sum to zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub guid: String,
    pub currency: CommodityId,
    pub num: Option<String>,
    pub date_posted: DateTime<FixedOffset>,
    pub date_entered: DateTime<FixedOffset>,
    pub description: Option<String>,
    pub splits: Vec<Split>,
    pub slots: Vec<Slot>,
}

impl Transaction {
    /// Exact sum of the split values; zero for a balanced transaction.
    pub fn imbalance(&self) -> Numeric {
        self.splits.iter().map(|s| &s.value).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.imbalance().is_zero()
    }
}

#[derive(Debug, PartialEq)]
pub(crate) struct ParsedSplit<'e> {
    pub(crate) guid: &'e str,
    pub(crate) account: &'e str,
    pub(crate) memo: Option<&'e str>,
    pub(crate) action: Option<&'e str>,
    pub(crate) reconciled_state: ReconcileState,
    pub(crate) reconcile_date: Option<DateTime<FixedOffset>>,
    pub(crate) value: Numeric,
    pub(crate) quantity: Numeric,
    pub(crate) slots: Vec<Slot>,
}

impl<'e> ParsedSplit<'e> {
    pub(crate) fn parse(el: &'e Element) -> Result<ParsedSplit<'e>> {
        Ok(ParsedSplit {
            guid: el.require_text(&[SPLIT_ID])?.trim(),
            account: el.require_text(&[SPLIT_ACCOUNT])?.trim(),
            memo: el.find_text(&[SPLIT_MEMO]),
            action: el.find_text(&[SPLIT_ACTION]),
            reconciled_state: el.require_text(&[SPLIT_RECONCILED_STATE])?.try_into()?,
            reconcile_date: el
                .find_text(&[SPLIT_RECONCILE_DATE, TS_DATE])
                .map(parse_date)
                .transpose()?,
            value: Numeric::parse(el.require_text(&[SPLIT_VALUE])?)?,
            quantity: Numeric::parse(el.require_text(&[SPLIT_QUANTITY])?)?,
            slots: slot::parse_slots(el.child(SPLIT_SLOTS))?,
        })
    }
}

/// A `gnc:transaction` element with its references still in text form.
#[derive(Debug, PartialEq)]
pub(crate) struct ParsedTransaction<'e> {
    pub(crate) guid: &'e str,
    pub(crate) currency: CommodityRef<'e>,
    pub(crate) num: Option<&'e str>,
    pub(crate) date_posted: DateTime<FixedOffset>,
    pub(crate) date_entered: DateTime<FixedOffset>,
    pub(crate) description: Option<&'e str>,
    pub(crate) splits: Vec<ParsedSplit<'e>>,
    pub(crate) slots: Vec<Slot>,
}

impl<'e> ParsedTransaction<'e> {
    pub(crate) fn parse(el: &'e Element) -> Result<ParsedTransaction<'e>> {
        Ok(ParsedTransaction {
            guid: el.require_text(&[TRN_ID])?.trim(),
            currency: CommodityRef::parse(el.require(&[TRN_CURRENCY])?)?,
            num: el.find_text(&[TRN_NUM]),
            date_posted: parse_date(el.require_text(&[TRN_DATE_POSTED, TS_DATE])?)?,
            date_entered: parse_date(el.require_text(&[TRN_DATE_ENTERED, TS_DATE])?)?,
            description: el.find_text(&[TRN_DESCRIPTION]),
            splits: el
                .child(TRN_SPLITS)
                .map(|splits| {
                    splits
                        .children_tagged(TRN_SPLIT)
                        .map(ParsedSplit::parse)
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()?
                .unwrap_or_default(),
            slots: slot::parse_slots(el.child(TRN_SLOTS))?,
        })
    }

    /// Builds the transaction, resolving each split's account through `account`.
    pub(crate) fn resolve<F>(
        self,
        id: TransactionId,
        currency: CommodityId,
        mut account: F,
    ) -> Result<Transaction>
    where
        F: FnMut(&str) -> Result<AccountId>,
    {
        let mut splits = Vec::with_capacity(self.splits.len());
        for (position, split) in self.splits.into_iter().enumerate() {
            splits.push(Split {
                id: SplitId {
                    transaction: id,
                    position,
                },
                guid: split.guid.to_string(),
                transaction: id,
                account: account(split.account)?,
                memo: split.memo.map(str::to_string),
                action: split.action.map(str::to_string),
                reconciled_state: split.reconciled_state,
                reconcile_date: split.reconcile_date,
                value: split.value,
                quantity: split.quantity,
                slots: split.slots,
            });
        }

        Ok(Transaction {
            id,
            guid: self.guid.to_string(),
            currency,
            num: self.num.map(str::to_string),
            date_posted: self.date_posted,
            date_entered: self.date_entered,
            description: self.description.map(str::to_string),
            splits,
            slots: self.slots,
        })
    }
}
