//! Constant generation from the live catalog.
//!
//! Turns the tags, custom fields and lists of an account into a PHP file of
//! named constants so application code can refer to `CampaignerTagConstants::VIP`
//! instead of a bare identifier. Display names are reduced to their ASCII
//! letters and digits; that reduction is not injective, so what happens when
//! two names collapse to one symbol is decided by a `CollisionPolicy`.

use std::collections::HashMap;

use handlebars::Handlebars;
use serde::Serialize;
use tracing::warn;

use crate::campaigner::Campaigner;
use crate::endpoint::Pagination;
use crate::error::ApiError;
use crate::id::Id;
use crate::transport::Transport;
use crate::types::{Field, List, Tag};

const HEADER: &str = "<?php\n";

const CLASS_TEMPLATE: &str = "
class {{class_name}}
{
{{#each entries}}
    // {{comment}}
    const {{symbol}} = {{id}};
{{/each}}
}
";

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("{kind} {id}: name {name:?} has no letters or digits")]
    EmptySymbol {
        kind: CatalogKind,
        name: String,
        id: Id,
    },

    #[error("{kind}: {first:?} and {second:?} both become {symbol}")]
    Collision {
        kind: CatalogKind,
        symbol: String,
        first: String,
        second: String,
    },

    #[error("template rendering failed: {0}")]
    Template(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The three catalogs, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Tags,
    Fields,
    Lists,
}

impl CatalogKind {
    pub fn class_name(self) -> &'static str {
        match self {
            CatalogKind::Tags => "CampaignerTagConstants",
            CatalogKind::Fields => "CampaignerFieldConstants",
            CatalogKind::Lists => "CampaignerListConstants",
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CatalogKind::Tags => "tags",
            CatalogKind::Fields => "fields",
            CatalogKind::Lists => "lists",
        };
        f.write_str(label)
    }
}

/// What to do when two names sanitise to the same symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Fail with `CodegenError::Collision`.
    #[default]
    Reject,
    /// Keep the first entry, log and drop the rest.
    KeepFirst,
    /// Emit every entry, duplicates included.
    KeepAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub kind: CatalogKind,
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn tags(tags: &[Tag]) -> Self {
        Self {
            kind: CatalogKind::Tags,
            entries: tags
                .iter()
                .map(|t| CatalogEntry {
                    name: t.name.clone(),
                    id: t.id,
                })
                .collect(),
        }
    }

    pub fn fields(fields: &[Field]) -> Self {
        Self {
            kind: CatalogKind::Fields,
            entries: fields
                .iter()
                .map(|f| CatalogEntry {
                    name: f.title.clone(),
                    id: f.id,
                })
                .collect(),
        }
    }

    pub fn lists(lists: &[List]) -> Self {
        Self {
            kind: CatalogKind::Lists,
            entries: lists
                .iter()
                .map(|l| CatalogEntry {
                    name: l.name.clone(),
                    id: l.id,
                })
                .collect(),
        }
    }
}

/// Delete every character that is not an ASCII letter or digit.
pub fn sanitize(name: &str) -> String {
    name.chars().filter(char::is_ascii_alphanumeric).collect()
}

#[derive(Serialize)]
struct Rendered {
    comment: String,
    symbol: String,
    id: u64,
}

#[derive(Serialize)]
struct ClassContext<'a> {
    class_name: &'a str,
    entries: Vec<Rendered>,
}

pub struct Generator {
    handlebars: Handlebars<'static>,
    policy: CollisionPolicy,
}

impl Generator {
    pub fn new(policy: CollisionPolicy) -> Result<Self, CodegenError> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string("class", CLASS_TEMPLATE)
            .map_err(|e| CodegenError::Template(e.to_string()))?;
        Ok(Self { handlebars, policy })
    }

    /// Sanitise the entries of one catalog and apply the collision policy.
    fn symbols(&self, catalog: &Catalog) -> Result<Vec<Rendered>, CodegenError> {
        let mut seen: HashMap<String, &str> = HashMap::new();
        let mut out = Vec::with_capacity(catalog.entries.len());

        for entry in &catalog.entries {
            let symbol = sanitize(&entry.name);
            if symbol.is_empty() {
                return Err(CodegenError::EmptySymbol {
                    kind: catalog.kind,
                    name: entry.name.clone(),
                    id: entry.id,
                });
            }

            if let Some(first) = seen.get(&symbol) {
                match self.policy {
                    CollisionPolicy::Reject => {
                        return Err(CodegenError::Collision {
                            kind: catalog.kind,
                            symbol,
                            first: (*first).to_string(),
                            second: entry.name.clone(),
                        });
                    }
                    CollisionPolicy::KeepFirst => {
                        warn!(
                            kind = %catalog.kind,
                            %symbol,
                            dropped = %entry.name,
                            "duplicate symbol skipped"
                        );
                        continue;
                    }
                    CollisionPolicy::KeepAll => {
                        warn!(kind = %catalog.kind, %symbol, "duplicate symbol emitted");
                    }
                }
            } else {
                seen.insert(symbol.clone(), &entry.name);
            }

            out.push(Rendered {
                comment: entry.name.replace(['\r', '\n'], " "),
                symbol,
                id: entry.id.get(),
            });
        }

        Ok(out)
    }

    pub fn render_catalog(&self, catalog: &Catalog) -> Result<String, CodegenError> {
        let context = ClassContext {
            class_name: catalog.kind.class_name(),
            entries: self.symbols(catalog)?,
        };
        self.handlebars
            .render("class", &context)
            .map_err(|e| CodegenError::Template(e.to_string()))
    }

    /// Render tags, fields and lists, in that order, as one PHP file.
    pub fn render(
        &self,
        tags: &Catalog,
        fields: &Catalog,
        lists: &Catalog,
    ) -> Result<String, CodegenError> {
        let mut out = String::from(HEADER);
        for catalog in [tags, fields, lists] {
            out.push_str(&self.render_catalog(catalog)?);
        }
        Ok(out)
    }

    /// Fetch the three catalogs from the service and render them.
    pub fn generate<T: Transport>(&self, client: &Campaigner<T>) -> Result<String, CodegenError> {
        let (tags, fields, lists) = fetch_catalogs(client)?;
        self.render(&tags, &fields, &lists)
    }
}

/// One page of each catalog, at the default page size.
pub fn fetch_catalogs<T: Transport>(
    client: &Campaigner<T>,
) -> Result<(Catalog, Catalog, Catalog), ApiError> {
    let page = Pagination::default();
    let tags = client.list::<Tag>(page)?;
    let fields = client.list::<Field>(page)?;
    let lists = client.list::<List>(page)?;
    Ok((
        Catalog::tags(&tags.items),
        Catalog::fields(&fields.items),
        Catalog::lists(&lists.items),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn catalog(kind: CatalogKind, entries: &[(&str, u64)]) -> Catalog {
        Catalog {
            kind,
            entries: entries
                .iter()
                .map(|(name, id)| CatalogEntry {
                    name: (*name).to_string(),
                    id: Id::new(*id),
                })
                .collect(),
        }
    }

    #[rstest]
    #[case("Onboarding - Account Activated", "OnboardingAccountActivated")]
    #[case("VIP", "VIP")]
    #[case("", "")]
    #[case("A-B", "AB")]
    #[case("A_B", "AB")]
    #[case("Café 2024!", "Caf2024")]
    fn sanitize_keeps_ascii_alphanumerics(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(sanitize(name), expected);
    }

    #[test]
    fn renders_one_constant_per_entry() {
        let generator = Generator::new(CollisionPolicy::Reject).unwrap();
        let out = generator
            .render_catalog(&catalog(CatalogKind::Tags, &[("VIP", 7)]))
            .unwrap();
        assert!(out.contains("class CampaignerTagConstants"));
        assert!(out.contains("    // VIP\n    const VIP = 7;"));
    }

    #[test]
    fn comment_keeps_original_name() {
        let generator = Generator::new(CollisionPolicy::Reject).unwrap();
        let out = generator
            .render_catalog(&catalog(
                CatalogKind::Tags,
                &[("Onboarding - Account Activated", 12)],
            ))
            .unwrap();
        assert!(out.contains(
            "    // Onboarding - Account Activated\n    const OnboardingAccountActivated = 12;"
        ));
    }

    #[test]
    fn names_are_not_html_escaped() {
        let generator = Generator::new(CollisionPolicy::Reject).unwrap();
        let out = generator
            .render_catalog(&catalog(CatalogKind::Lists, &[("Tom & Jerry <fans>", 3)]))
            .unwrap();
        assert!(out.contains("// Tom & Jerry <fans>"));
        assert!(out.contains("const TomJerryfans = 3;"));
    }

    #[test]
    fn blocks_render_in_fixed_order() {
        let generator = Generator::new(CollisionPolicy::Reject).unwrap();
        let out = generator
            .render(
                &catalog(CatalogKind::Tags, &[("VIP", 7)]),
                &catalog(CatalogKind::Fields, &[("Plan", 2)]),
                &catalog(CatalogKind::Lists, &[("Newsletter", 3)]),
            )
            .unwrap();
        assert!(out.starts_with("<?php\n"));
        let tags = out.find("CampaignerTagConstants").unwrap();
        let fields = out.find("CampaignerFieldConstants").unwrap();
        let lists = out.find("CampaignerListConstants").unwrap();
        assert!(tags < fields && fields < lists);
    }

    #[test]
    fn empty_symbol_is_rejected() {
        let generator = Generator::new(CollisionPolicy::KeepAll).unwrap();
        let err = generator
            .render_catalog(&catalog(CatalogKind::Tags, &[("---", 1)]))
            .unwrap_err();
        assert!(matches!(err, CodegenError::EmptySymbol { .. }));
    }

    #[test]
    fn collision_rejected_by_default() {
        let generator = Generator::new(CollisionPolicy::default()).unwrap();
        let err = generator
            .render_catalog(&catalog(CatalogKind::Tags, &[("A-B", 1), ("A_B", 2)]))
            .unwrap_err();
        match err {
            CodegenError::Collision {
                symbol,
                first,
                second,
                ..
            } => {
                assert_eq!(symbol, "AB");
                assert_eq!(first, "A-B");
                assert_eq!(second, "A_B");
            }
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn collision_keep_first_drops_later_entries() {
        let generator = Generator::new(CollisionPolicy::KeepFirst).unwrap();
        let out = generator
            .render_catalog(&catalog(CatalogKind::Tags, &[("A-B", 1), ("A_B", 2)]))
            .unwrap();
        assert!(out.contains("const AB = 1;"));
        assert!(!out.contains("const AB = 2;"));
    }

    #[test]
    fn collision_keep_all_emits_duplicates() {
        let generator = Generator::new(CollisionPolicy::KeepAll).unwrap();
        let out = generator
            .render_catalog(&catalog(CatalogKind::Tags, &[("A-B", 1), ("A_B", 2)]))
            .unwrap();
        assert_eq!(out.matches("const AB =").count(), 2);
    }

    #[test]
    fn same_symbol_in_different_catalogs_is_fine() {
        let generator = Generator::new(CollisionPolicy::Reject).unwrap();
        let out = generator
            .render(
                &catalog(CatalogKind::Tags, &[("VIP", 7)]),
                &catalog(CatalogKind::Fields, &[("VIP", 2)]),
                &catalog(CatalogKind::Lists, &[]),
            )
            .unwrap();
        assert_eq!(out.matches("const VIP =").count(), 2);
    }
}
