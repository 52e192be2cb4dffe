use crate::index::{commodity_key, CommodityId};
use crate::slot::{self, Slot};
use crate::xml::{Element, Ns, Tag};
use crate::{GnucashError, Result};
use uuid::Uuid;

use std::fmt;

const SPACE: Tag = Tag::new(Ns::Cmdty, "space");
const ID: Tag = Tag::new(Ns::Cmdty, "id");
const NAME: Tag = Tag::new(Ns::Cmdty, "name");
const XCODE: Tag = Tag::new(Ns::Cmdty, "xcode");
const FRACTION: Tag = Tag::new(Ns::Cmdty, "fraction");
const QUOTE_SOURCE: Tag = Tag::new(Ns::Cmdty, "quote_source");
const GET_QUOTES: Tag = Tag::new(Ns::Cmdty, "get_quotes");
const QUOTE_TZ: Tag = Tag::new(Ns::Cmdty, "quote_tz");
const SLOTS: Tag = Tag::new(Ns::Cmdty, "slots");

/// A currency or security, identified by its namespace (`space`) and symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct Commodity {
    pub id: CommodityId,
    pub space: String,
    pub symbol: String,
    pub name: Option<String>,
    pub xcode: Option<String>,
    pub fraction: Option<u64>,
    pub quote_source: Option<String>,
    pub get_quotes: bool,
    pub quote_tz: Option<String>,
    pub slots: Vec<Slot>,
}

impl Commodity {
    pub(crate) fn parse(el: &Element, id: CommodityId) -> Result<Commodity> {
        Ok(Commodity {
            id,
            space: el.require_text(&[SPACE])?.trim().to_string(),
            symbol: el.require_text(&[ID])?.trim().to_string(),
            name: optional_text(el, NAME),
            xcode: optional_text(el, XCODE),
            fraction: el
                .find_text(&[FRACTION])
                .map(|f| {
                    f.trim()
                        .parse()
                        .map_err(|_| GnucashError::MalformedNumber(f.to_string()))
                })
                .transpose()?,
            quote_source: optional_text(el, QUOTE_SOURCE),
            get_quotes: el.child(GET_QUOTES).is_some(),
            quote_tz: optional_text(el, QUOTE_TZ),
            slots: slot::parse_slots(el.child(SLOTS))?,
        })
    }

    /// The synthesized identity key this commodity is indexed under.
    pub fn key(&self) -> Uuid {
        commodity_key(&self.space, &self.symbol)
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.space, self.symbol)
    }
}

/// A commodity as referenced from an account, transaction or price: nested
/// `cmdty:space` and `cmdty:id`, no GUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CommodityRef<'e> {
    pub(crate) space: &'e str,
    pub(crate) symbol: &'e str,
}

impl<'e> CommodityRef<'e> {
    pub(crate) fn parse(el: &'e Element) -> Result<CommodityRef<'e>> {
        Ok(CommodityRef {
            space: el.require_text(&[SPACE])?.trim(),
            symbol: el.require_text(&[ID])?.trim(),
        })
    }

    /// `Ok(None)` when the reference element itself is absent.
    pub(crate) fn parse_at(el: &'e Element, tag: Tag) -> Result<Option<CommodityRef<'e>>> {
        el.child(tag).map(CommodityRef::parse).transpose()
    }
}

fn optional_text(el: &Element, tag: Tag) -> Option<String> {
    el.find_text(&[tag]).map(str::to_string)
}
