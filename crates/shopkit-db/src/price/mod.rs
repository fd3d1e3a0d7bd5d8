//! # Price Domain Managers
//!
//! The price entity family: base prices, their reference lists and the
//! list types.
//!
//! ## Domain Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Price Domain                                      │
//! │                                                                         │
//! │  price              shop_price            AS pri                        │
//! │    └── list         shop_price_list       AS prili                      │
//! │          └── type   shop_price_list_type  AS prility                    │
//! │                                                                         │
//! │  prili."parentid"  ──► pri."id"       (which price the entry belongs to)│
//! │  prili."typeid"    ──► prility."id"   (what kind of reference it is)    │
//! │  prili."refid"     ──► foreign domain (product, customer, ...)          │
//! │                                                                         │
//! │  The parent manager's registry carries the child's keys WITH the       │
//! │  join, so `price.list.refid` is searchable straight from the price     │
//! │  manager. The child's own registry carries the same keys unjoined.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use shopkit_core::{AttributeDefinition, AttributeRegistry, CoreResult, SemanticType};
use shopkit_manager::{ConfigSource, ManagerContext, ManagerHandle, ManagerRegistry, ManagerResult};

use crate::entity::{aliased_catalog, SqlManager};

pub mod list;
pub mod list_type;

/// Join pulling price list entries into a price statement.
const LIST_JOIN: &str =
    r#"LEFT JOIN "shop_price_list" AS prili ON ( pri."id" = prili."parentid" )"#;

/// The price attribute catalog: own columns plus joined list keys.
pub fn attributes() -> CoreResult<AttributeRegistry> {
    let mut registry = AttributeRegistry::new();

    registry.register(AttributeDefinition::new(
        "price.id",
        r#"pri."id""#,
        SemanticType::Int,
        "Price ID",
    ))?;
    registry.register(
        AttributeDefinition::new(
            "price.siteid",
            r#"pri."siteid""#,
            SemanticType::Str,
            "Price site ID",
        )
        .hidden(),
    )?;
    registry.register(
        AttributeDefinition::new(
            "price.typeid",
            r#"pri."typeid""#,
            SemanticType::Int,
            "Price type ID",
        )
        .hidden(),
    )?;
    registry.register(AttributeDefinition::new(
        "price.currencyid",
        r#"pri."currencyid""#,
        SemanticType::Str,
        "Price currency code",
    ))?;
    registry.register(AttributeDefinition::new(
        "price.domain",
        r#"pri."domain""#,
        SemanticType::Str,
        "Price domain",
    ))?;
    registry.register(AttributeDefinition::new(
        "price.label",
        r#"pri."label""#,
        SemanticType::Str,
        "Price label",
    ))?;
    registry.register(AttributeDefinition::new(
        "price.quantity",
        r#"pri."quantity""#,
        SemanticType::Int,
        "Price quantity",
    ))?;
    registry.register(AttributeDefinition::new(
        "price.value",
        r#"pri."value""#,
        SemanticType::Float,
        "Price value",
    ))?;
    registry.register(AttributeDefinition::new(
        "price.costs",
        r#"pri."costs""#,
        SemanticType::Float,
        "Price shipping costs",
    ))?;
    registry.register(AttributeDefinition::new(
        "price.rebate",
        r#"pri."rebate""#,
        SemanticType::Float,
        "Price rebate amount",
    ))?;
    registry.register(AttributeDefinition::new(
        "price.taxrate",
        r#"pri."taxrate""#,
        SemanticType::Float,
        "Price tax rate",
    ))?;
    registry.register(AttributeDefinition::new(
        "price.status",
        r#"pri."status""#,
        SemanticType::Int,
        "Price status",
    ))?;
    registry.register(AttributeDefinition::new(
        "price.ctime",
        r#"pri."ctime""#,
        SemanticType::DateTime,
        "Price create date/time",
    ))?;
    registry.register(AttributeDefinition::new(
        "price.mtime",
        r#"pri."mtime""#,
        SemanticType::DateTime,
        "Price modification date/time",
    ))?;
    registry.register(AttributeDefinition::new(
        "price.editor",
        r#"pri."editor""#,
        SemanticType::Str,
        "Price editor",
    ))?;

    // List keys searchable from the price manager, via the list join
    for def in list::definitions(Some(LIST_JOIN)) {
        registry.register(def)?;
    }

    Ok(registry)
}

/// Builds the standard price manager.
pub fn standard(ctx: &ManagerContext) -> ManagerResult<ManagerHandle> {
    let sub_domains = ctx
        .config
        .get_list("shopkit/price/manager/submanagers", &["list"]);

    Ok(Arc::new(SqlManager::new(
        "price",
        "shop_price",
        r#"pri."siteid""#,
        ctx,
        attributes()?,
        aliased_catalog("pri"),
        sub_domains,
    )))
}

/// Registers the standard factories for the whole price family.
pub fn register_price_managers(registry: &mut ManagerRegistry) {
    registry.register("price", "Standard", Box::new(standard));
    registry.register("price/list", "Standard", Box::new(list::standard));
    registry.register("price/list/type", "Standard", Box::new(list_type::standard));
}

// =============================================================================
// Unit Tests
// =============================================================================
