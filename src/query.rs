//! Student listing: filter composition, ranking and page slicing over a
//! [`RecordStore`] snapshot.
//!
//! Filters are applied in a fixed order (search, equality filters, category),
//! then the surviving rows are counted and one page is cut out. The
//! `top_by_cgpa` category ranks and caps the set *before* paging.

use crate::model::{AcademicYear, Branch, PlacementStatus, StudentRecord};
use crate::store::{RecordStore, StoreError, StoreScope};
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// How many students the `top_by_cgpa` category keeps, across all pages.
pub const TOP_BY_CGPA_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("page must be an integer, got {0}")]
    InvalidPage(String),
    #[error("pageSize must be a positive integer, got {0}")]
    InvalidPageSize(String),
    #[error("{0}")]
    InvalidParam(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidPage(_)
            | QueryError::InvalidPageSize(_)
            | QueryError::InvalidParam(_) => "bad_params",
            QueryError::Store(e) => e.code(),
        }
    }
}

/// A filter on a closed enumeration. Values that name no member are kept
/// so the listing can answer "nothing matches" instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumFilter<T> {
    Match(T),
    Unrecognized(String),
}

impl<T: Copy> EnumFilter<T> {
    fn resolved(&self) -> Option<T> {
        match self {
            EnumFilter::Match(v) => Some(*v),
            EnumFilter::Unrecognized(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Placed,
    HasBacklogs,
    HasScholarship,
    HostelResident,
    TopByCgpa,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Placed,
        Category::HasBacklogs,
        Category::HasScholarship,
        Category::HostelResident,
        Category::TopByCgpa,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Placed => "placed",
            Category::HasBacklogs => "has_backlogs",
            Category::HasScholarship => "has_scholarship",
            Category::HostelResident => "hostel_resident",
            Category::TopByCgpa => "top_by_cgpa",
        }
    }

    /// Accepts the canonical names and the older short forms
    /// (`backlogs`, `scholarship`, `hostel`, `top_cgpa`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "placed" => Some(Category::Placed),
            "has_backlogs" | "backlogs" => Some(Category::HasBacklogs),
            "has_scholarship" | "scholarship" => Some(Category::HasScholarship),
            "hostel_resident" | "hostel" => Some(Category::HostelResident),
            "top_by_cgpa" | "top_cgpa" => Some(Category::TopByCgpa),
            _ => None,
        }
    }

    fn keeps(self, s: &StudentRecord) -> bool {
        let p = &s.profile;
        match self {
            Category::Placed => p.placement_status == Some(PlacementStatus::Placed),
            Category::HasBacklogs => p.backlogs > 0,
            Category::HasScholarship => p.scholarship_status,
            Category::HostelResident => p.hostel_resident,
            Category::TopByCgpa => p.cgpa.is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search_term: Option<String>,
    pub branch: Option<EnumFilter<Branch>>,
    pub academic_year: Option<EnumFilter<AcademicYear>>,
    pub internship_status: Option<String>,
    pub parent_id: Option<i64>,
    pub category: Option<Category>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search_term: None,
            branch: None,
            academic_year: None,
            internship_status: None,
            parent_id: None,
            category: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
    #[serde(rename = "students")]
    pub items: Vec<StudentRecord>,
    pub total: usize,
    pub page_count: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Builds criteria from listing params. `default_page_size` applies when
/// the request leaves `pageSize` unset.
pub fn parse_criteria(
    raw: &serde_json::Value,
    default_page_size: usize,
) -> Result<FilterCriteria, QueryError> {
    let empty = serde_json::Map::new();
    let obj = match raw {
        serde_json::Value::Null => &empty,
        serde_json::Value::Object(m) => m,
        _ => {
            return Err(QueryError::InvalidParam(
                "params must be an object".into(),
            ))
        }
    };

    let search_term = opt_text(obj, "search")?.map(|s| s.to_string());

    let branch = opt_text(obj, "branch")?.map(|s| match Branch::lookup(s) {
        Some(b) => EnumFilter::Match(b),
        None => EnumFilter::Unrecognized(s.to_string()),
    });
    let academic_year = opt_text(obj, "year")?.map(|s| match AcademicYear::lookup(s) {
        Some(y) => EnumFilter::Match(y),
        None => EnumFilter::Unrecognized(s.to_string()),
    });

    let internship_status = opt_text(obj, "internshipStatus")?.map(|s| s.to_string());
    let parent_id = match obj.get("parentId") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => match as_integer(v).map(i64::try_from) {
            Some(Ok(id)) => Some(id),
            _ => {
                return Err(QueryError::InvalidParam(format!(
                    "parentId must be an integer id, got {v}"
                )))
            }
        },
    };

    let category_raw = match opt_text(obj, "category")? {
        Some(v) => Some(v),
        None => opt_text(obj, "filterType")?,
    };
    let category = category_raw.and_then(|s| {
        let c = Category::parse(s);
        if c.is_none() {
            tracing::debug!(category = s, "ignoring unknown listing category");
        }
        c
    });

    let page = match obj.get("page") {
        None | Some(serde_json::Value::Null) => 1,
        Some(v) => {
            let Some(n) = as_integer(v) else {
                return Err(QueryError::InvalidPage(v.to_string()));
            };
            // Pages past the addressable range just land past the end.
            if n < 1 {
                1
            } else {
                usize::try_from(n).unwrap_or(usize::MAX)
            }
        }
    };

    let page_size = match obj.get("pageSize") {
        None | Some(serde_json::Value::Null) => default_page_size,
        Some(v) => match as_integer(v) {
            Some(n) if n >= 1 => usize::try_from(n).unwrap_or(usize::MAX),
            _ => return Err(QueryError::InvalidPageSize(v.to_string())),
        },
    };
    if page_size == 0 {
        return Err(QueryError::InvalidPageSize("0".into()));
    }

    Ok(FilterCriteria {
        search_term,
        branch,
        academic_year,
        internship_status,
        parent_id,
        category,
        page,
        page_size,
    })
}

/// Trimmed, non-empty string param. Non-string values are rejected.
fn opt_text<'a>(
    obj: &'a serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Result<Option<&'a str>, QueryError> {
    match obj.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => {
            let t = s.trim();
            Ok(if t.is_empty() { None } else { Some(t) })
        }
        Some(_) => Err(QueryError::InvalidParam(format!("{key} must be a string"))),
    }
}

/// Integers, and strings holding one (query-string style). Digit strings
/// too long for `i128` saturate.
fn as_integer(v: &serde_json::Value) -> Option<i128> {
    match v {
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        serde_json::Value::String(s) => {
            let t = s.trim();
            let (negative, digits) = match t.strip_prefix('-') {
                Some(d) => (true, d),
                None => (false, t.strip_prefix('+').unwrap_or(t)),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let magnitude = digits.parse::<i128>().unwrap_or(i128::MAX);
            Some(if negative { -magnitude } else { magnitude })
        }
        _ => None,
    }
}

fn empty_page(criteria: &FilterCriteria) -> QueryPage {
    QueryPage {
        items: Vec::new(),
        total: 0,
        page_count: 1,
        page: criteria.page.max(1),
        page_size: criteria.page_size,
    }
}

/// Runs one listing query against a store snapshot.
pub fn run(store: &dyn RecordStore, criteria: &FilterCriteria) -> Result<QueryPage, QueryError> {
    if criteria.page_size == 0 {
        return Err(QueryError::InvalidPageSize("0".into()));
    }

    // An enum filter naming no member can match nothing.
    let branch = match &criteria.branch {
        None => None,
        Some(f) => match f.resolved() {
            Some(b) => Some(b),
            None => return Ok(empty_page(criteria)),
        },
    };
    let academic_year = match &criteria.academic_year {
        None => None,
        Some(f) => match f.resolved() {
            Some(y) => Some(y),
            None => return Ok(empty_page(criteria)),
        },
    };

    // Branch, year, internship status and parent are plain equality
    // filters, so letting the store apply them first gives the same set as
    // applying them after search.
    let scope = StoreScope {
        branch,
        academic_year,
        internship_status: criteria.internship_status.clone(),
        parent_id: criteria.parent_id,
    };
    let rows = store.fetch_scoped(&scope)?;
    Ok(paginate(filter_rows(rows, criteria, &scope), criteria))
}

/// Steps 2-5: search, equality filters (branch, year, internship status,
/// parent), category.
pub fn filter_rows(
    rows: Vec<StudentRecord>,
    criteria: &FilterCriteria,
    scope: &StoreScope,
) -> Vec<StudentRecord> {
    let needle = criteria.search_term.as_deref().map(str::to_lowercase);

    let mut rows: Vec<StudentRecord> = rows
        .into_iter()
        .filter(|s| match &needle {
            None => true,
            Some(n) => s
                .searchable_fields()
                .any(|field| field.to_lowercase().contains(n.as_str())),
        })
        .filter(|s| scope.matches(s))
        .collect();

    if let Some(category) = criteria.category {
        rows.retain(|s| category.keeps(s));
        if category == Category::TopByCgpa {
            // Stable sort: equal CGPAs keep store (id) order.
            rows.sort_by(|a, b| {
                let a = a.profile.cgpa.unwrap_or(0.0);
                let b = b.profile.cgpa.unwrap_or(0.0);
                b.total_cmp(&a)
            });
            rows.truncate(TOP_BY_CGPA_LIMIT);
        }
    }
    rows
}

/// Steps 6-8: count, page count (at least 1), slice.
pub fn paginate(rows: Vec<StudentRecord>, criteria: &FilterCriteria) -> QueryPage {
    let page = criteria.page.max(1);
    let page_size = criteria.page_size.max(1);
    let total = rows.len();
    let page_count = if total == 0 {
        1
    } else {
        total.div_ceil(page_size)
    };

    let start = (page - 1).saturating_mul(page_size);
    let items: Vec<StudentRecord> = rows.into_iter().skip(start).take(page_size).collect();

    QueryPage {
        items,
        total,
        page_count,
        page,
        page_size,
    }
}
