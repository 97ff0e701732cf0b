//! Service page extraction
//!
//! Turns one "Actions, resources, and condition keys" page into its action
//! table. The table uses `rowspan` for actions with several resource types,
//! which shows up as shorter continuation rows underneath the primary row.
//!
//! Missing page elements never fail: no heading means no display name, no
//! prefix paragraph means unqualified action names, no table means no actions.

use crate::catalog::{qualified_name, ActionRecord, LinkRef};
use crate::error::FetchError;
use crate::fetch::Fetcher;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use url::Url;

const TITLE_BOILERPLATE: &str = r"^\s*Actions,\s+resources,\s+and\s+condition\s+keys\s+for\s+";
const PREFIX_MARKER: &str = "service prefix:";
const TABLE_CONTAINER: &str = "div.table-container table";

/// How rows of the actions table are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TablePolicy {
    /// Six-cell primary rows plus three-cell continuation rows. Resource
    /// types and condition keys are collected; every linked action is kept.
    #[default]
    Detailed,
    /// Any row with at least three cells is a primary row. Only name,
    /// description and access level are read; actions without an access
    /// level are dropped.
    Basic,
}

/// Everything extracted from one service page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePage {
    pub service_name: Option<String>,
    pub prefix: Option<String>,
    pub actions: BTreeMap<String, ActionRecord>,
    pub url: Url,
}

/// Fetch a service page and extract its actions
pub async fn extract_service(
    fetcher: &Fetcher,
    url: &str,
    policy: TablePolicy,
    table_id_prefix: &str,
) -> Result<ServicePage, FetchError> {
    let page = fetcher.fetch(url).await?;
    let doc = page.document();
    Ok(service_page_from_document(&doc, &page.url, policy, table_id_prefix))
}

/// Extract display name, prefix and actions from a service page's HTML
pub fn parse_service_page(
    html: &str,
    page_url: &Url,
    policy: TablePolicy,
    table_id_prefix: &str,
) -> ServicePage {
    let doc = Html::parse_document(html);
    service_page_from_document(&doc, page_url, policy, table_id_prefix)
}

fn service_page_from_document(
    doc: &Html,
    page_url: &Url,
    policy: TablePolicy,
    table_id_prefix: &str,
) -> ServicePage {
    let prefix = extract_prefix(doc);

    let actions = match find_actions_table(doc, table_id_prefix) {
        Some(table) => parse_actions_table(table, page_url, prefix.as_deref(), policy),
        None => BTreeMap::new(),
    };

    ServicePage {
        service_name: extract_service_name(doc),
        prefix,
        actions,
        url: page_url.clone(),
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

fn title_boilerplate() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TITLE_BOILERPLATE).unwrap())
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Display name from the page heading, boilerplate removed
fn extract_service_name(doc: &Html) -> Option<String> {
    let heading = doc
        .select(&selector("h1.topictitle"))
        .next()
        .or_else(|| doc.select(&selector("h1")).next())?;

    let text = element_text(heading);
    let text = whitespace().replace_all(&text, " ");
    let name = title_boilerplate().replace(&text, "").trim().to_string();

    (!name.is_empty()).then_some(name)
}

/// Short code from the first paragraph mentioning the service prefix
fn extract_prefix(doc: &Html) -> Option<String> {
    let code_class = selector("code.code");
    let code_any = selector("code");

    doc.select(&selector("p"))
        .filter(|p| p.text().collect::<String>().contains(PREFIX_MARKER))
        .find_map(|p| {
            p.select(&code_class)
                .next()
                .or_else(|| p.select(&code_any).next())
                .map(element_text)
                .filter(|code| !code.is_empty())
        })
}

/// Locate the actions table: first table inside the table container,
/// otherwise the first table whose id starts with `id_prefix`.
fn find_actions_table<'a>(doc: &'a Html, id_prefix: &str) -> Option<ElementRef<'a>> {
    if let Some(table) = doc.select(&selector(TABLE_CONTAINER)).next() {
        return Some(table);
    }

    doc.select(&selector("table[id]")).find(|table| {
        table
            .value()
            .attr("id")
            .is_some_and(|id| id.starts_with(id_prefix))
    })
}

fn parse_actions_table(
    table: ElementRef<'_>,
    page_url: &Url,
    prefix: Option<&str>,
    policy: TablePolicy,
) -> BTreeMap<String, ActionRecord> {
    let row_sel = selector("tr");
    let cell_sel = selector("td");

    let mut actions: BTreeMap<String, ActionRecord> = BTreeMap::new();
    let mut current: Option<String> = None;

    for row in table.select(&row_sel).skip(1) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();

        match policy {
            TablePolicy::Detailed if cells.len() == 6 => {
                current = None;
                let Some((action, mut record)) = primary_row(&cells, page_url, prefix) else {
                    continue;
                };
                record.resource_types = Some(cell_links(cells[3], page_url));
                record.condition_keys = Some(cell_links(cells[4], page_url));
                actions.insert(action.clone(), record);
                current = Some(action);
            }
            TablePolicy::Detailed if cells.len() == 3 => {
                let Some(record) = current.as_ref().and_then(|a| actions.get_mut(a)) else {
                    continue;
                };
                record
                    .resource_types
                    .get_or_insert_with(Vec::new)
                    .extend(cell_links(cells[0], page_url));
                record
                    .condition_keys
                    .get_or_insert_with(Vec::new)
                    .extend(cell_links(cells[1], page_url));
            }
            TablePolicy::Basic if cells.len() >= 3 => {
                let Some((action, record)) = primary_row(&cells, page_url, prefix) else {
                    continue;
                };
                if record.access_level.is_empty() {
                    tracing::debug!(action = %action, "dropping action without access level");
                    continue;
                }
                actions.insert(action, record);
            }
            _ => {}
        }
    }

    actions
}

/// Name, description and access level of a primary row
fn primary_row(
    cells: &[ElementRef<'_>],
    page_url: &Url,
    prefix: Option<&str>,
) -> Option<(String, ActionRecord)> {
    let link = action_link(cells[0])?;
    let action = element_text(link);
    let href = link.value().attr("href").unwrap_or_default();

    let record = ActionRecord {
        action_name: qualified_name(prefix, &action),
        description: element_text(cells[1]),
        access_level: element_text(cells[2]),
        resource_types: None,
        condition_keys: None,
        url: resolve(page_url, href),
    };

    Some((action, record))
}

/// The action cell usually opens with an empty `<a id=...>` target before
/// the real link; prefer the first anchor that has both href and text.
fn action_link(cell: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let anchors: Vec<ElementRef<'_>> = cell.select(&selector("a")).collect();

    anchors
        .iter()
        .copied()
        .find(|a| a.value().attr("href").is_some() && !element_text(*a).is_empty())
        .or_else(|| anchors.first().copied())
}

fn cell_links(cell: ElementRef<'_>, page_url: &Url) -> Vec<LinkRef> {
    cell.select(&selector("a[href]"))
        .map(|a| LinkRef {
            name: element_text(a),
            reference_href: resolve(page_url, a.value().attr("href").unwrap_or_default()),
        })
        .collect()
}

/// Resolve `href` against the page URL, keeping it verbatim if unjoinable
fn resolve(base: &Url, href: &str) -> String {
    base.join(href)
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}
