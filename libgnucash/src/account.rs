use crate::commodity::CommodityRef;
use crate::index::{AccountId, CommodityId};
use crate::slot::{self, Slot};
use crate::xml::{Element, Ns, Tag};
use crate::{GnucashError, Result};

use std::fmt;

const NAME: Tag = Tag::new(Ns::Act, "name");
const ID: Tag = Tag::new(Ns::Act, "id");
const TYPE: Tag = Tag::new(Ns::Act, "type");
const CODE: Tag = Tag::new(Ns::Act, "code");
const DESCRIPTION: Tag = Tag::new(Ns::Act, "description");
const COMMODITY: Tag = Tag::new(Ns::Act, "commodity");
const COMMODITY_SCU: Tag = Tag::new(Ns::Act, "commodity-scu");
const PARENT: Tag = Tag::new(Ns::Act, "parent");
const SLOTS: Tag = Tag::new(Ns::Act, "slots");

/// GnuCash account types, as spelled in `act:type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccountType {
    None,
    Root,
    Bank,
    Cash,
    Credit,
    Asset,
    Liability,
    Stock,
    Mutual,
    Currency,
    Income,
    Expense,
    Equity,
    Receivable,
    Payable,
    Trading,
    Checking,
    Savings,
    MoneyMarket,
    CreditLine,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::None => "NONE",
            AccountType::Root => "ROOT",
            AccountType::Bank => "BANK",
            AccountType::Cash => "CASH",
            AccountType::Credit => "CREDIT",
            AccountType::Asset => "ASSET",
            AccountType::Liability => "LIABILITY",
            AccountType::Stock => "STOCK",
            AccountType::Mutual => "MUTUAL",
            AccountType::Currency => "CURRENCY",
            AccountType::Income => "INCOME",
            AccountType::Expense => "EXPENSE",
            AccountType::Equity => "EQUITY",
            AccountType::Receivable => "RECEIVABLE",
            AccountType::Payable => "PAYABLE",
            AccountType::Trading => "TRADING",
            AccountType::Checking => "CHECKING",
            AccountType::Savings => "SAVINGS",
            AccountType::MoneyMarket => "MONEYMRKT",
            AccountType::CreditLine => "CREDITLINE",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AccountType {
    type Error = GnucashError;

    fn try_from(s: &str) -> Result<Self> {
        let ty = match s.trim() {
            "NONE" => AccountType::None,
            "ROOT" => AccountType::Root,
            "BANK" => AccountType::Bank,
            "CASH" => AccountType::Cash,
            "CREDIT" => AccountType::Credit,
            "ASSET" => AccountType::Asset,
            "LIABILITY" => AccountType::Liability,
            "STOCK" => AccountType::Stock,
            "MUTUAL" => AccountType::Mutual,
            "CURRENCY" => AccountType::Currency,
            "INCOME" => AccountType::Income,
            "EXPENSE" => AccountType::Expense,
            "EQUITY" => AccountType::Equity,
            "RECEIVABLE" => AccountType::Receivable,
            "PAYABLE" => AccountType::Payable,
            "TRADING" => AccountType::Trading,
            "CHECKING" => AccountType::Checking,
            "SAVINGS" => AccountType::Savings,
            "MONEYMRKT" => AccountType::MoneyMarket,
            "CREDITLINE" => AccountType::CreditLine,
            _ => {
                return Err(crate::format_err(format!(
                    "input `{}' is not a valid account type",
                    s
                )))
            }
        };
        Ok(ty)
    }
}

/// A node in the chart of accounts. Relations are resolved: `parent` and
/// `commodity` are handles into the owning [`Book`][crate::Book].
#[derive(Clone, Debug, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub guid: String,
    pub name: String,
    pub kind: AccountType,
    pub code: Option<String>,
    pub description: Option<String>,
    pub commodity: Option<CommodityId>,
    pub commodity_scu: Option<u64>,
    pub parent: Option<AccountId>,
    pub slots: Vec<Slot>,
}

impl Account {
    pub fn is_root(&self) -> bool {
        self.kind == AccountType::Root
    }
}

/// A `gnc:account` element with its references still in text form.
#[derive(Debug, PartialEq)]
pub(crate) struct ParsedAccount<'e> {
    pub(crate) guid: &'e str,
    pub(crate) name: &'e str,
    pub(crate) kind: AccountType,
    pub(crate) code: Option<&'e str>,
    pub(crate) description: Option<&'e str>,
    pub(crate) commodity: Option<CommodityRef<'e>>,
    pub(crate) commodity_scu: Option<u64>,
    pub(crate) parent: Option<&'e str>,
    pub(crate) slots: Vec<Slot>,
}

impl<'e> ParsedAccount<'e> {
    pub(crate) fn parse(el: &'e Element) -> Result<ParsedAccount<'e>> {
        Ok(ParsedAccount {
            guid: el.require_text(&[ID])?.trim(),
            name: el.require_text(&[NAME])?,
            kind: el.require_text(&[TYPE])?.try_into()?,
            code: el.find_text(&[CODE]),
            description: el.find_text(&[DESCRIPTION]),
            commodity: CommodityRef::parse_at(el, COMMODITY)?,
            commodity_scu: el
                .find_text(&[COMMODITY_SCU])
                .map(|scu| {
                    scu.trim()
                        .parse()
                        .map_err(|_| GnucashError::MalformedNumber(scu.to_string()))
                })
                .transpose()?,
            parent: el.find_text(&[PARENT]).map(str::trim),
            slots: slot::parse_slots(el.child(SLOTS))?,
        })
    }

    pub(crate) fn resolve(
        self,
        id: AccountId,
        parent: Option<AccountId>,
        commodity: Option<CommodityId>,
    ) -> Account {
        Account {
            id,
            guid: self.guid.to_string(),
            name: self.name.to_string(),
            kind: self.kind,
            code: self.code.map(str::to_string),
            description: self.description.map(str::to_string),
            commodity,
            commodity_scu: self.commodity_scu,
            parent,
            slots: self.slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::account::{AccountType, ParsedAccount};
    use crate::commodity::CommodityRef;
    use crate::index::{AccountId, CommodityId};
    use crate::xml::read_document;
    use crate::GnucashError;

    use anyhow::Result;

    const ACCOUNT: &str = r#"<gnc:account version="2.0.0"
        xmlns:gnc="http://www.gnucash.org/XML/gnc"
        xmlns:act="http://www.gnucash.org/XML/act"
        xmlns:cmdty="http://www.gnucash.org/XML/cmdty"
        xmlns:slot="http://www.gnucash.org/XML/slot">
  <act:name>Checking</act:name>
  <act:id type="guid">6b9cf3e5a8a04c0f9f7a4a0e1d7d6c11</act:id>
  <act:type>BANK</act:type>
  <act:commodity>
    <cmdty:space>CURRENCY</cmdty:space>
    <cmdty:id>EUR</cmdty:id>
  </act:commodity>
  <act:commodity-scu>100</act:commodity-scu>
  <act:slots>
    <slot>
      <slot:key>placeholder</slot:key>
      <slot:value type="string">false</slot:value>
    </slot>
  </act:slots>
  <act:parent type="guid">a0b6f3e5a8a04c0f9f7a4a0e1d7d6c00</act:parent>
</gnc:account>"#;

    #[test]
    fn parse_account() -> Result<()> {
        let el = read_document(ACCOUNT.as_bytes())?;
        let parsed = ParsedAccount::parse(&el)?;
        assert_eq!(parsed.guid, "6b9cf3e5a8a04c0f9f7a4a0e1d7d6c11");
        assert_eq!(parsed.kind, AccountType::Bank);
        assert_eq!(parsed.description, None);
        assert_eq!(parsed.code, None);
        assert_eq!(
            parsed.commodity,
            Some(CommodityRef {
                space: "CURRENCY",
                symbol: "EUR"
            })
        );
        assert_eq!(parsed.parent, Some("a0b6f3e5a8a04c0f9f7a4a0e1d7d6c00"));

        let account = parsed.resolve(AccountId(1), Some(AccountId(0)), Some(CommodityId(0)));
        assert_eq!(account.name, "Checking");
        assert_eq!(account.commodity_scu, Some(100));
        assert_eq!(account.slots.len(), 1);
        assert!(!account.is_root());
        Ok(())
    }

    #[test]
    fn account_type_round_trip() -> Result<()> {
        for name in ["ROOT", "ASSET", "MONEYMRKT", "CREDITLINE", "TRADING"] {
            assert_eq!(AccountType::try_from(name)?.to_string(), name);
        }
        assert_eq!(
            format!("{}", AccountType::try_from("Assets").unwrap_err()),
            "format error: input `Assets' is not a valid account type"
        );
        Ok(())
    }

    #[test]
    fn missing_name_is_format_error() -> Result<()> {
        let el = read_document(
            r#"<gnc:account xmlns:gnc="http://www.gnucash.org/XML/gnc"
                 xmlns:act="http://www.gnucash.org/XML/act">
                 <act:id type="guid">01</act:id><act:type>ROOT</act:type>
               </gnc:account>"#
                .as_bytes(),
        )?;
        assert!(matches!(
            ParsedAccount::parse(&el),
            Err(GnucashError::Format(_))
        ));
        Ok(())
    }
}
