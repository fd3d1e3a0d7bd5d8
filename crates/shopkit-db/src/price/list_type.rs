//! Price list type manager: the kinds of price references ("default",
//! "promotion", ...).

use std::sync::Arc;

use shopkit_core::{AttributeDefinition, AttributeRegistry, CoreResult, SemanticType};
use shopkit_manager::{ConfigSource, ManagerContext, ManagerHandle, ManagerResult};

use crate::entity::{aliased_catalog, SqlManager};

/// The price list type attribute definitions on the `prility` alias.
pub(crate) fn definitions(join: Option<&str>) -> Vec<AttributeDefinition> {
    let defs = vec![
        AttributeDefinition::new(
            "price.list.type.id",
            r#"prility."id""#,
            SemanticType::Int,
            "Price list type ID",
        )
        .hidden(),
        AttributeDefinition::new(
            "price.list.type.siteid",
            r#"prility."siteid""#,
            SemanticType::Str,
            "Price list type site ID",
        )
        .hidden(),
        AttributeDefinition::new(
            "price.list.type.code",
            r#"prility."code""#,
            SemanticType::Str,
            "Price list type code",
        ),
        AttributeDefinition::new(
            "price.list.type.domain",
            r#"prility."domain""#,
            SemanticType::Str,
            "Price list type domain",
        ),
        AttributeDefinition::new(
            "price.list.type.label",
            r#"prility."label""#,
            SemanticType::Str,
            "Price list type label",
        ),
        AttributeDefinition::new(
            "price.list.type.status",
            r#"prility."status""#,
            SemanticType::Int,
            "Price list type status",
        ),
        AttributeDefinition::new(
            "price.list.type.ctime",
            r#"prility."ctime""#,
            SemanticType::DateTime,
            "Price list type create date/time",
        ),
        AttributeDefinition::new(
            "price.list.type.mtime",
            r#"prility."mtime""#,
            SemanticType::DateTime,
            "Price list type modification date/time",
        ),
        AttributeDefinition::new(
            "price.list.type.editor",
            r#"prility."editor""#,
            SemanticType::Str,
            "Price list type editor",
        ),
    ];

    match join {
        Some(clause) => defs.into_iter().map(|def| def.join(clause)).collect(),
        None => defs,
    }
}

/// The price list type attribute catalog.
pub fn attributes() -> CoreResult<AttributeRegistry> {
    let mut registry = AttributeRegistry::new();
    for def in definitions(None) {
        registry.register(def)?;
    }
    Ok(registry)
}

/// Builds the standard price list type manager.
pub fn standard(ctx: &ManagerContext) -> ManagerResult<ManagerHandle> {
    let sub_domains = ctx
        .config
        .get_list("shopkit/price/manager/list/type/submanagers", &[]);

    Ok(Arc::new(SqlManager::new(
        "price/list/type",
        "shop_price_list_type",
        r#"prility."siteid""#,
        ctx,
        attributes()?,
        aliased_catalog("prility"),
        sub_domains,
    )))
}

// =============================================================================
// Unit Tests
// =============================================================================
