//! Closed set of item attributes a feed column can read or default.

use std::borrow::Cow;
use std::str::FromStr;

use shopfeed_catalog::{Item, parse_tags};
use shopfeed_core::{DomainError, DomainResult, Price};

/// An item attribute addressable by mapping tables and user defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Handle,
    Title,
    Description,
    Vendor,
    Sku,
    Tags,
    Price,
    Url,
    ImageUrl,
    AgeGroup,
    Color,
    Gender,
    ProductCategory,
    Size,
    ItemGroupId,
    Mpn,
}

impl Field {
    pub const ALL: [Field; 16] = [
        Field::Handle,
        Field::Title,
        Field::Description,
        Field::Vendor,
        Field::Sku,
        Field::Tags,
        Field::Price,
        Field::Url,
        Field::ImageUrl,
        Field::AgeGroup,
        Field::Color,
        Field::Gender,
        Field::ProductCategory,
        Field::Size,
        Field::ItemGroupId,
        Field::Mpn,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Handle => "handle",
            Field::Title => "title",
            Field::Description => "description",
            Field::Vendor => "vendor",
            Field::Sku => "sku",
            Field::Tags => "tags",
            Field::Price => "price",
            Field::Url => "url",
            Field::ImageUrl => "image_url",
            Field::AgeGroup => "age_group",
            Field::Color => "color",
            Field::Gender => "gender",
            Field::ProductCategory => "product_category",
            Field::Size => "size",
            Field::ItemGroupId => "item_group_id",
            Field::Mpn => "mpn",
        }
    }

    /// Raw attribute text. Tags are joined with `", "`; the price uses two
    /// decimals.
    pub fn read(self, item: &Item) -> Cow<'_, str> {
        let text: &str = match self {
            Field::Handle => item.handle().as_str(),
            Field::Title => &item.title,
            Field::Description => &item.description,
            Field::Vendor => &item.vendor,
            Field::Sku => &item.sku,
            Field::Tags => return Cow::Owned(item.tags_string()),
            Field::Price => return Cow::Owned(item.price.to_string()),
            Field::Url => &item.url,
            Field::ImageUrl => &item.image_url,
            Field::AgeGroup => &item.age_group,
            Field::Color => &item.color,
            Field::Gender => &item.gender,
            Field::ProductCategory => &item.product_category,
            Field::Size => &item.size,
            Field::ItemGroupId => &item.item_group_id,
            Field::Mpn => &item.mpn,
        };
        Cow::Borrowed(text)
    }

    /// A zero price counts as empty.
    pub fn is_empty(self, item: &Item) -> bool {
        match self {
            Field::Price => !item.price.is_set(),
            Field::Tags => item.tags.is_empty(),
            other => other.read(item).is_empty(),
        }
    }

    pub fn write(self, item: &mut Item, value: &str) -> DomainResult<()> {
        let slot = match self {
            Field::Handle => {
                return Err(DomainError::validation("an item handle cannot be overwritten"));
            }
            Field::Price => {
                item.price = value.parse::<Price>()?;
                return Ok(());
            }
            Field::Tags => {
                item.tags = parse_tags(value);
                return Ok(());
            }
            Field::Title => &mut item.title,
            Field::Description => &mut item.description,
            Field::Vendor => &mut item.vendor,
            Field::Sku => &mut item.sku,
            Field::Url => &mut item.url,
            Field::ImageUrl => &mut item.image_url,
            Field::AgeGroup => &mut item.age_group,
            Field::Color => &mut item.color,
            Field::Gender => &mut item.gender,
            Field::ProductCategory => &mut item.product_category,
            Field::Size => &mut item.size,
            Field::ItemGroupId => &mut item.item_group_id,
            Field::Mpn => &mut item.mpn,
        };
        *slot = value.to_string();
        Ok(())
    }
}

impl core::fmt::Display for Field {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown item field '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for field in Field::ALL {
            assert_eq!(field.name().parse::<Field>().unwrap(), field);
        }
        assert!("g_color".parse::<Field>().is_err());
    }

    #[test]
    fn write_then_read() {
        let mut item = Item::new("Slim Suit");
        Field::Color.write(&mut item, "navy").unwrap();
        Field::Price.write(&mut item, "99.5").unwrap();
        Field::Tags.write(&mut item, "suit, navy").unwrap();

        assert_eq!(Field::Color.read(&item), "navy");
        assert_eq!(Field::Price.read(&item), "99.50");
        assert_eq!(item.tags, ["suit", "navy"]);
        assert!(Field::Handle.write(&mut item, "other").is_err());
        assert_eq!(Field::Handle.read(&item), "slim-suit");
    }

    #[test]
    fn zero_price_is_empty() {
        let item = Item::new("Slim Suit");
        assert!(Field::Price.is_empty(&item));
        assert!(Field::Tags.is_empty(&item));
        assert!(!Field::Title.is_empty(&item));
    }
}
