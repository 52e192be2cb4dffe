use libgnucash::{
    parse, parse_file, AccountType, Book, GnucashError, Numeric, ReconcileState, SlotValue,
};

use anyhow::{anyhow, Result};
use flate2::write::GzEncoder;
use flate2::Compression;

use std::io::Write;
use std::path::{Path, PathBuf};

fn sample_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/sample.gnucash")
}

fn sample() -> Result<Book> {
    Ok(parse_file(&sample_path(), None)?)
}

#[test]
fn every_transaction_balances() -> Result<()> {
    let book = sample()?;
    assert_eq!(book.transactions().len(), 2);
    for txn in book.transactions() {
        let sum: Numeric = txn.splits.iter().map(|s| &s.value).sum();
        assert!(sum.is_zero(), "{} is off by {}", txn.guid, sum);
    }
    Ok(())
}

#[test]
fn account_tree() -> Result<()> {
    let book = sample()?;
    let root = book.root_account();
    assert_eq!(root.kind, AccountType::Root);
    assert_eq!(root.parent, None);

    for account in book.accounts().iter().filter(|a| !a.is_root()) {
        let parent = book.parent(account).ok_or(anyhow!("{} has no parent", account.name))?;
        let children = book.children(parent).ok_or(anyhow!("no children"))?;
        assert!(children.iter().any(|c| c.id == account.id));
    }

    let names = book
        .walk()
        .map(|(account, _, _)| book.fullname(account))
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "",
            "Assets",
            "Expenses",
            "Assets:Checking",
            "Assets:Brokerage",
            "Expenses:Groceries"
        ]
    );
    Ok(())
}

#[test]
fn account_details() -> Result<()> {
    let book = sample()?;
    let groceries = book
        .account_by_guid("a2100000000000000000000000000000")
        .ok_or(anyhow!("no groceries"))?;
    assert_eq!(groceries.description.as_deref(), Some("Food & household"));
    let splits = book.splits(groceries).ok_or(anyhow!("no splits"))?;
    assert_eq!(splits.len(), 2);
    assert_eq!(
        splits
            .iter()
            .map(|s| s.memo.as_deref())
            .collect::<Vec<_>>(),
        vec![Some("vegetables"), Some("household")]
    );

    let checking = book
        .account_by_guid("a1100000000000000000000000000000")
        .ok_or(anyhow!("no checking"))?;
    assert_eq!(checking.code.as_deref(), Some("1100"));
    let splits = book.splits(checking).ok_or(anyhow!("no splits"))?;
    let balance: Numeric = splits.iter().map(|s| &s.quantity).sum();
    assert_eq!(balance, Numeric::parse("-53188/100")?);

    let assets = book.parent(checking).ok_or(anyhow!("no assets"))?;
    assert_eq!(assets.slots[0].value, SlotValue::String("true".into()));
    Ok(())
}

#[test]
fn commodity_identity() -> Result<()> {
    let book = sample()?;
    let eur = book
        .commodity_by_symbol("CURRENCY", "EUR")
        .ok_or(anyhow!("no EUR"))?;
    assert!(eur.get_quotes);

    // every EUR reference, wherever it appears, lands on the same node
    for txn in book.transactions() {
        assert_eq!(txn.currency, eur.id);
    }
    let price = &book.prices()[0];
    assert_eq!(price.currency, eur.id);
    assert_eq!(price.value, Numeric::parse("14917/100")?);

    let brokerage = book
        .account_by_guid("a1200000000000000000000000000000")
        .ok_or(anyhow!("no brokerage"))?;
    let aapl = book.commodity_of(brokerage).ok_or(anyhow!("no AAPL"))?;
    assert_eq!(aapl.id, price.commodity);
    assert_eq!(aapl.fraction, Some(10000));
    assert_eq!(book.commodities().len(), 3);
    Ok(())
}

#[test]
fn splits_and_slots() -> Result<()> {
    let book = sample()?;
    let buy = book
        .transaction_by_guid("t2000000000000000000000000000000")
        .ok_or(anyhow!("no buy"))?;
    assert_eq!(buy.num, None);
    assert_eq!(buy.splits[0].reconciled_state, ReconcileState::Reconciled);
    assert!(buy.splits[0].reconcile_date.is_some());
    assert_eq!(buy.splits[1].action.as_deref(), Some("Buy"));
    assert_eq!(buy.splits[1].quantity, Numeric::from(3));

    let shopping = &book.transactions()[0];
    assert_eq!(shopping.num.as_deref(), Some("17"));
    assert!(matches!(shopping.slots[0].value, SlotValue::GDate(_)));

    let features = book.slots()[0]
        .value
        .frame_slots()
        .ok_or(anyhow!("features is not a frame"))??;
    assert_eq!(features.len(), 1);
    Ok(())
}

#[test]
fn gzip_compressed_file() -> Result<()> {
    let plain = std::fs::read(sample_path())?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&plain)?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sample.gnucash");
    std::fs::write(&path, encoder.finish()?)?;

    let book = parse_file(&path, None)?;
    assert_eq!(book.guid(), sample()?.guid());
    assert_eq!(book.accounts().len(), 6);
    Ok(())
}

#[test]
fn malformed_root_is_rejected() -> Result<()> {
    let text = std::fs::read_to_string(sample_path())?.replace("gnc-v2", "gnc-v1");
    assert!(matches!(parse(&text, None), Err(GnucashError::Format(_))));
    Ok(())
}

#[test]
fn dangling_split_account_is_rejected() -> Result<()> {
    let text = std::fs::read_to_string(sample_path())?.replace(
        "<split:account type=\"guid\">a1200000000000000000000000000000</split:account>",
        "<split:account type=\"guid\">ffff0000000000000000000000000000</split:account>",
    );
    match parse(&text, None) {
        Err(GnucashError::Reference { key, .. }) => {
            assert_eq!(key, "ffff0000000000000000000000000000")
        }
        other => return Err(anyhow!("unexpected {:?}", other.map(|b| b.guid().to_string()))),
    }
    Ok(())
}

#[test]
fn missing_file() {
    assert!(matches!(
        parse_file(Path::new("does/not/exist.gnucash"), None),
        Err(GnucashError::Io(_))
    ));
}
