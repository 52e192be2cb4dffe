use crate::account::{Account, AccountType, ParsedAccount};
use crate::book::Book;
use crate::commodity::Commodity;
use crate::index::{AccountId, CommodityId, CrossRef, PriceId, SplitId, TransactionId};
use crate::parser::Options;
use crate::price::ParsedPrice;
use crate::slot::{self, Slot};
use crate::transaction::ParsedTransaction;
use crate::xml::{Element, Ns, Tag};
use crate::{format_err, GnucashError, Result};
use indexmap::IndexMap;
use log::{debug, trace, warn};

use std::collections::VecDeque;

const GNC_V2: Tag = Tag::new(Ns::None, "gnc-v2");
const PRICE: Tag = Tag::new(Ns::None, "price");

const BOOK: Tag = Tag::new(Ns::Gnc, "book");
const COUNT_DATA: Tag = Tag::new(Ns::Gnc, "count-data");
const COMMODITY: Tag = Tag::new(Ns::Gnc, "commodity");
const ACCOUNT: Tag = Tag::new(Ns::Gnc, "account");
const TRANSACTION: Tag = Tag::new(Ns::Gnc, "transaction");
const PRICEDB: Tag = Tag::new(Ns::Gnc, "pricedb");

const BOOK_ID: Tag = Tag::new(Ns::Book, "id");
const BOOK_SLOTS: Tag = Tag::new(Ns::Book, "slots");

/// The only `gnc:pricedb` layout this decoder understands.
const PRICEDB_VERSION: &str = "1";

/// The placeholder commodity GnuCash writes for scheduled transaction
/// templates; it is not part of the declared commodity count.
const TEMPLATE_SPACE: &str = "template";

/// Decodes a whole `gnc-v2` document into its single book.
pub(crate) fn decode(document: &Element, options: &Options) -> Result<Book> {
    if !document.is(GNC_V2) {
        return Err(format_err(format!(
            "expected document element `{}', found `{}'",
            GNC_V2,
            document.qualified_name()
        )));
    }

    let mut books = document.children_tagged(BOOK);
    let book = books
        .next()
        .ok_or_else(|| format_err(format!("no `{}' in document", BOOK)))?;
    if books.next().is_some() {
        return Err(format_err(format!("more than one `{}' in document", BOOK)));
    }

    if options.verify_counts {
        for count in document.children_tagged(COUNT_DATA) {
            let (kind, declared) = count_data(count)?;
            if kind == "book" && declared != 1 {
                return Err(GnucashError::Integrity(format!(
                    "document declares {} books, found 1",
                    declared
                )));
            }
        }
    }

    let mut builder = BookBuilder::new(options);
    for child in book.children() {
        builder.visit(child)?;
    }
    builder.finish()
}

/// `(cd:type, count)` of a `gnc:count-data` element.
fn count_data(el: &Element) -> Result<(&str, usize)> {
    let kind = el
        .attribute("type")
        .ok_or_else(|| format_err(format!("`{}' without a type", COUNT_DATA)))?;
    let count = el
        .text()
        .trim()
        .parse()
        .map_err(|_| GnucashError::MalformedNumber(el.text().to_string()))?;
    Ok((kind, count))
}

/// Collects the children of one `gnc:book`, then links them into a [`Book`].
///
/// Nodes are registered in the index as they are met, but references are
/// only resolved in [`BookBuilder::finish`], once every node is known.
struct BookBuilder<'e> {
    options: &'e Options,
    guid: Option<&'e str>,
    slots: Vec<Slot>,
    index: CrossRef,
    commodities: Vec<Commodity>,
    accounts: Vec<ParsedAccount<'e>>,
    transactions: Vec<ParsedTransaction<'e>>,
    prices: Vec<ParsedPrice<'e>>,
    declared: IndexMap<&'e str, usize>,
    seen: IndexMap<&'static str, usize>,
}

impl<'e> BookBuilder<'e> {
    fn new(options: &'e Options) -> Self {
        BookBuilder {
            options,
            guid: None,
            slots: Vec::new(),
            index: CrossRef::new(),
            commodities: Vec::new(),
            accounts: Vec::new(),
            transactions: Vec::new(),
            prices: Vec::new(),
            declared: IndexMap::new(),
            seen: IndexMap::new(),
        }
    }

    fn tally(&mut self, kind: &'static str) {
        *self.seen.entry(kind).or_insert(0) += 1;
    }

    fn visit(&mut self, el: &'e Element) -> Result<()> {
        if el.is(BOOK_ID) {
            self.guid = Some(el.text().trim());
        } else if el.is(BOOK_SLOTS) {
            self.slots = slot::parse_slots(Some(el))?;
        } else if el.is(COUNT_DATA) {
            let (kind, count) = count_data(el)?;
            self.declared.insert(kind, count);
        } else if el.is(COMMODITY) {
            self.commodity(el)?;
        } else if el.is(ACCOUNT) {
            self.account(el)?;
        } else if el.is(TRANSACTION) {
            self.transaction(el)?;
        } else if el.is(PRICEDB) {
            self.pricedb(el)?;
        } else {
            trace!("skipping `{}'", el.qualified_name());
        }
        Ok(())
    }

    fn commodity(&mut self, el: &'e Element) -> Result<()> {
        let id = CommodityId(self.commodities.len());
        let commodity = Commodity::parse(el, id)?;
        if commodity.space != TEMPLATE_SPACE {
            self.tally("commodity");
        }

        let owner = self.index.commodities.register(commodity.key(), id);
        if owner == id {
            self.commodities.push(commodity);
            return Ok(());
        }

        let existing = &self.commodities[owner.0];
        if existing.space != commodity.space || existing.symbol != commodity.symbol {
            return Err(GnucashError::Integrity(format!(
                "commodity `{}' collides with `{}'",
                commodity, existing
            )));
        }
        warn!("commodity `{}' declared more than once", commodity);
        Ok(())
    }

    fn account(&mut self, el: &'e Element) -> Result<()> {
        let account = ParsedAccount::parse(el)?;
        let id = AccountId(self.accounts.len());
        if self.index.accounts.register(account.guid.to_string(), id) != id {
            warn!("account `{}' declared more than once", account.guid);
        }
        self.tally("account");
        self.accounts.push(account);
        Ok(())
    }

    fn transaction(&mut self, el: &'e Element) -> Result<()> {
        let transaction = ParsedTransaction::parse(el)?;
        let id = TransactionId(self.transactions.len());
        if self.index.transactions.register(transaction.guid.to_string(), id) != id {
            warn!("transaction `{}' declared more than once", transaction.guid);
        }
        self.tally("transaction");
        self.transactions.push(transaction);
        Ok(())
    }

    fn pricedb(&mut self, el: &'e Element) -> Result<()> {
        match el.attribute("version") {
            Some(PRICEDB_VERSION) => {}
            version => {
                return Err(GnucashError::UnsupportedVersion {
                    element: "gnc:pricedb",
                    version: version.unwrap_or_default().to_string(),
                })
            }
        }
        for price in el.children_tagged(PRICE) {
            self.prices.push(ParsedPrice::parse(price)?);
            self.tally("price");
        }
        Ok(())
    }

    fn finish(self) -> Result<Book> {
        let BookBuilder {
            options,
            guid,
            slots,
            index,
            commodities,
            accounts: parsed_accounts,
            transactions: parsed_transactions,
            prices: parsed_prices,
            declared,
            seen,
        } = self;

        let guid = guid
            .ok_or_else(|| format_err(format!("missing `{}' in `{}'", BOOK_ID, BOOK)))?
            .to_string();

        if options.verify_counts {
            verify_counts(&declared, &seen)?;
        }

        let mut root = None;
        let mut accounts = Vec::with_capacity(parsed_accounts.len());
        for (i, parsed) in parsed_accounts.into_iter().enumerate() {
            let id = AccountId(i);
            let parent = parsed
                .parent
                .map(|guid| index.resolve_account(guid))
                .transpose()?;
            let commodity = parsed
                .commodity
                .map(|c| index.resolve_commodity(c.space, c.symbol))
                .transpose()?;

            match (parsed.kind == AccountType::Root, parent) {
                (true, Some(_)) => {
                    return Err(format_err(format!(
                        "root account `{}' has a parent",
                        parsed.guid
                    )))
                }
                (true, None) if root.is_some() => {
                    return Err(format_err(format!(
                        "second root account `{}'",
                        parsed.guid
                    )))
                }
                (true, None) => root = Some(id),
                (false, None) => {
                    return Err(format_err(format!(
                        "account `{}' has no parent",
                        parsed.guid
                    )))
                }
                (false, Some(_)) => {}
            }

            accounts.push(parsed.resolve(id, parent, commodity));
        }
        let root = root.ok_or_else(|| format_err("book has no root account"))?;

        let mut children = vec![Vec::new(); accounts.len()];
        for account in &accounts {
            if let Some(parent) = account.parent {
                children[parent.0].push(account.id);
            }
        }
        verify_reachable(&accounts, &children, root)?;

        let mut transactions = Vec::with_capacity(parsed_transactions.len());
        let mut postings: Vec<Vec<SplitId>> = vec![Vec::new(); accounts.len()];
        for (i, parsed) in parsed_transactions.into_iter().enumerate() {
            let currency = index.resolve_commodity(parsed.currency.space, parsed.currency.symbol)?;
            let transaction =
                parsed.resolve(TransactionId(i), currency, |guid| index.resolve_account(guid))?;

            if options.verify_balance && !transaction.is_balanced() {
                return Err(GnucashError::Integrity(format!(
                    "transaction `{}' is off balance by {}",
                    transaction.guid,
                    transaction.imbalance()
                )));
            }
            for split in &transaction.splits {
                postings[split.account.0].push(split.id);
            }
            transactions.push(transaction);
        }

        let prices = parsed_prices
            .into_iter()
            .enumerate()
            .map(|(i, parsed)| {
                let commodity =
                    index.resolve_commodity(parsed.commodity.space, parsed.commodity.symbol)?;
                let currency =
                    index.resolve_commodity(parsed.currency.space, parsed.currency.symbol)?;
                Ok(parsed.resolve(PriceId(i), commodity, currency))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "book {}: {} commodities, {} accounts, {} transactions, {} prices",
            guid,
            commodities.len(),
            accounts.len(),
            transactions.len(),
            prices.len()
        );

        Ok(Book {
            guid,
            slots,
            commodities,
            accounts,
            transactions,
            prices,
            root,
            index,
            children,
            postings,
        })
    }
}

/// Element kinds whose `gnc:count-data` is compared against what was decoded.
const COUNTED: [&str; 4] = ["commodity", "account", "transaction", "price"];

fn verify_counts(declared: &IndexMap<&str, usize>, seen: &IndexMap<&str, usize>) -> Result<()> {
    for (&kind, &count) in declared {
        if !COUNTED.contains(&kind) {
            trace!("not checking count of {} {} elements", count, kind);
            continue;
        }
        let found = seen.get(kind).copied().unwrap_or(0);
        if count != found {
            return Err(GnucashError::Integrity(format!(
                "book declares {} {} elements, found {}",
                count, kind, found
            )));
        }
    }
    Ok(())
}

/// Every account must hang off the root; anything else sits on a cycle.
fn verify_reachable(
    accounts: &[Account],
    children: &[Vec<AccountId>],
    root: AccountId,
) -> Result<()> {
    let mut reached = vec![false; accounts.len()];
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        if std::mem::replace(&mut reached[id.0], true) {
            continue;
        }
        queue.extend(children[id.0].iter().copied());
    }

    match reached.iter().position(|r| !r) {
        Some(i) => Err(GnucashError::Integrity(format!(
            "account `{}' is not reachable from the root",
            accounts[i].guid
        ))),
        None => Ok(()),
    }
}
