//! Typed key/value metadata attached to books, accounts, transactions,
//! splits and commodities.

use crate::amount::Numeric;
use crate::date::parse_date;
use crate::xml::{Element, Ns, Tag};
use crate::{GnucashError, Result};
use chrono::{DateTime, FixedOffset};

const SLOT: Tag = Tag::new(Ns::None, "slot");
const KEY: Tag = Tag::new(Ns::Slot, "key");
const VALUE: Tag = Tag::new(Ns::Slot, "value");
const GDATE: Tag = Tag::new(Ns::None, "gdate");
const TS_DATE: Tag = Tag::new(Ns::Ts, "date");

#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    pub key: String,
    pub value: SlotValue,
}

/// Decoded `slot:value`, tagged by its `type` attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum SlotValue {
    /// `integer` and `double`
    Integer(i64),
    Numeric(Numeric),
    String(String),
    Guid(String),
    GDate(DateTime<FixedOffset>),
    Timespec(DateTime<FixedOffset>),
    /// Child elements left undecoded, see [`SlotValue::frame_slots`].
    Frame(Vec<Element>),
    List(Vec<SlotValue>),
}

impl SlotValue {
    /// Decodes a `slot:value` element; `type` defaults to `string`.
    pub fn decode(el: &Element) -> Result<SlotValue> {
        let text = el.text();
        match el.attribute("type").unwrap_or("string") {
            "integer" | "double" => text
                .trim()
                .parse()
                .map(SlotValue::Integer)
                .map_err(|_| GnucashError::MalformedNumber(text.to_string())),
            "numeric" => Numeric::parse(text).map(SlotValue::Numeric),
            "string" => Ok(SlotValue::String(text.to_string())),
            "guid" => Ok(SlotValue::Guid(text.to_string())),
            "gdate" => parse_date(el.require_text(&[GDATE])?).map(SlotValue::GDate),
            "timespec" => parse_date(el.require_text(&[TS_DATE])?).map(SlotValue::Timespec),
            "frame" => Ok(SlotValue::Frame(el.children().to_vec())),
            "list" => el
                .children()
                .iter()
                .map(SlotValue::decode)
                .collect::<Result<Vec<_>>>()
                .map(SlotValue::List),
            other => Err(GnucashError::UnknownSlotType(other.to_string())),
        }
    }

    /// Decodes the `<slot>` children of a frame value, one level deep.
    /// `None` for every other kind of value.
    pub fn frame_slots(&self) -> Option<Result<Vec<Slot>>> {
        match self {
            SlotValue::Frame(children) => Some(
                children
                    .iter()
                    .filter(|c| c.is(SLOT))
                    .map(Slot::parse)
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SlotValue::String(s) | SlotValue::Guid(s) => Some(s),
            _ => None,
        }
    }
}

impl Slot {
    pub fn parse(el: &Element) -> Result<Slot> {
        Ok(Slot {
            key: el.require_text(&[KEY])?.to_string(),
            value: SlotValue::decode(el.require(&[VALUE])?)?,
        })
    }
}

/// Decodes every `<slot>` in a `*:slots` container; no container, no slots.
pub(crate) fn parse_slots(container: Option<&Element>) -> Result<Vec<Slot>> {
    match container {
        Some(el) => el.children_tagged(SLOT).map(Slot::parse).collect(),
        None => Ok(Vec::new()),
    }
}
