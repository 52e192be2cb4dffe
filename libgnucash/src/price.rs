//! Quoted prices from the book's `gnc:pricedb`.

use crate::amount::Numeric;
use crate::commodity::CommodityRef;
use crate::date::parse_date;
use crate::index::{CommodityId, PriceId};
use crate::xml::{Element, Ns, Tag};
use crate::Result;
use chrono::{DateTime, FixedOffset};

const ID: Tag = Tag::new(Ns::Price, "id");
const COMMODITY: Tag = Tag::new(Ns::Price, "commodity");
const CURRENCY: Tag = Tag::new(Ns::Price, "currency");
const TIME: Tag = Tag::new(Ns::Price, "time");
const SOURCE: Tag = Tag::new(Ns::Price, "source");
const TYPE: Tag = Tag::new(Ns::Price, "type");
const VALUE: Tag = Tag::new(Ns::Price, "value");
const TS_DATE: Tag = Tag::new(Ns::Ts, "date");

/// The value of one unit of `commodity`, expressed in `currency`, at `date`.
#[derive(Clone, Debug, PartialEq)]
pub struct Price {
    pub id: PriceId,
    pub guid: String,
    pub commodity: CommodityId,
    pub currency: CommodityId,
    pub date: DateTime<FixedOffset>,
    pub value: Numeric,
    pub source: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, PartialEq)]
pub(crate) struct ParsedPrice<'e> {
    pub(crate) guid: &'e str,
    pub(crate) commodity: CommodityRef<'e>,
    pub(crate) currency: CommodityRef<'e>,
    pub(crate) date: DateTime<FixedOffset>,
    pub(crate) value: Numeric,
    pub(crate) source: Option<&'e str>,
    pub(crate) kind: Option<&'e str>,
}

impl<'e> ParsedPrice<'e> {
    pub(crate) fn parse(el: &'e Element) -> Result<ParsedPrice<'e>> {
        Ok(ParsedPrice {
            guid: el.require_text(&[ID])?.trim(),
            commodity: CommodityRef::parse(el.require(&[COMMODITY])?)?,
            currency: CommodityRef::parse(el.require(&[CURRENCY])?)?,
            date: parse_date(el.require_text(&[TIME, TS_DATE])?)?,
            value: Numeric::parse(el.require_text(&[VALUE])?)?,
            source: el.find_text(&[SOURCE]),
            kind: el.find_text(&[TYPE]),
        })
    }

    pub(crate) fn resolve(
        self,
        id: PriceId,
        commodity: CommodityId,
        currency: CommodityId,
    ) -> Price {
        Price {
            id,
            guid: self.guid.to_string(),
            commodity,
            currency,
            date: self.date,
            value: self.value,
            source: self.source.map(str::to_string),
            kind: self.kind.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::amount::Numeric;
    use crate::index::{CommodityId, PriceId};
    use crate::price::ParsedPrice;
    use crate::xml::read_document;
    use crate::GnucashError;

    use anyhow::Result;

    const PRICE: &str = r#"<price
        xmlns:price="http://www.gnucash.org/XML/price"
        xmlns:cmdty="http://www.gnucash.org/XML/cmdty"
        xmlns:ts="http://www.gnucash.org/XML/ts">
  <price:id type="guid">9d1e5fa4b30a4d0a8c3b1a2d3e4f5a6b</price:id>
  <price:commodity>
    <cmdty:space>NASDAQ</cmdty:space>
    <cmdty:id>AAPL</cmdty:id>
  </price:commodity>
  <price:currency>
    <cmdty:space>CURRENCY</cmdty:space>
    <cmdty:id>USD</cmdty:id>
  </price:currency>
  <price:time><ts:date>2020-06-12 00:00:00 +0200</ts:date></price:time>
  <price:source>user:price-editor</price:source>
  <price:value>338800/1000</price:value>
</price>"#;

    #[test]
    fn parse_price() -> Result<()> {
        let el = read_document(PRICE.as_bytes())?;
        let parsed = ParsedPrice::parse(&el)?;
        assert_eq!(parsed.commodity.symbol, "AAPL");
        assert_eq!(parsed.currency.space, "CURRENCY");
        assert_eq!(parsed.kind, None);

        let price = parsed.resolve(PriceId(0), CommodityId(2), CommodityId(1));
        assert_eq!(price.value, Numeric::parse("1694/5")?);
        assert_eq!(price.source.as_deref(), Some("user:price-editor"));
        assert_eq!(price.date.naive_utc().to_string(), "2020-06-11 22:00:00");
        assert_eq!(price.commodity, CommodityId(2));
        Ok(())
    }

    #[test]
    fn price_needs_a_currency() -> Result<()> {
        let start = PRICE.find("<price:currency>").unwrap_or_default();
        let end = PRICE.find("<price:time>").unwrap_or_default();
        let doc = format!("{}{}", &PRICE[..start], &PRICE[end..]);
        let el = read_document(doc.as_bytes())?;
        assert!(matches!(
            ParsedPrice::parse(&el),
            Err(GnucashError::Format(_))
        ));
        Ok(())
    }
}
