//! Relationship linker: many-to-many association records.
//!
//! Four association tables connect employees to patents, projects, and
//! publications, and projects to companies. Each row carries descriptive
//! metadata (role, contribution, dates). Duplicate (A, B) pairs are
//! permitted by design: the same pair may appear with different roles.

pub mod handlers;
pub mod repository;

use crate::resources::{ColumnKind, ColumnSpec};

const fn col(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        required: false,
    }
}

/// Metadata for one association table. `a` is the enriching side: listing by
/// the B id joins against the A table and orders by `a_display`.
#[derive(Debug)]
pub struct LinkSpec {
    /// URL segment and table name, e.g. `employee_patents`
    pub table: &'static str,
    pub a_table: &'static str,
    pub a_fk: &'static str,
    pub b_fk: &'static str,
    /// Columns selected from the A table alongside each link row, as
    /// (column, alias) pairs.
    pub a_select: &'static [(&'static str, &'static str)],
    /// A-side column the enriched listing is ordered by
    pub a_display: &'static str,
    /// Attached metadata columns on the association row itself
    pub attrs: &'static [ColumnSpec],
}

use ColumnKind::{Date, Text};

pub static EMPLOYEE_PATENTS: LinkSpec = LinkSpec {
    table: "employee_patents",
    a_table: "employees",
    a_fk: "employee_id",
    b_fk: "patent_id",
    a_select: &[
        ("name", "employee_name"),
        ("designation", "employee_designation"),
        ("department", "employee_department"),
    ],
    a_display: "name",
    attrs: &[col("role", Text), col("contribution", Text)],
};

pub static EMPLOYEE_PROJECTS: LinkSpec = LinkSpec {
    table: "employee_projects",
    a_table: "employees",
    a_fk: "employee_id",
    b_fk: "project_id",
    a_select: &[
        ("name", "employee_name"),
        ("designation", "employee_designation"),
        ("department", "employee_department"),
    ],
    a_display: "name",
    attrs: &[
        col("role", Text),
        col("contribution", Text),
        col("start_date", Date),
        col("end_date", Date),
    ],
};

pub static EMPLOYEE_PUBLICATIONS: LinkSpec = LinkSpec {
    table: "employee_publications",
    a_table: "employees",
    a_fk: "employee_id",
    b_fk: "publication_id",
    a_select: &[
        ("name", "employee_name"),
        ("designation", "employee_designation"),
        ("department", "employee_department"),
    ],
    a_display: "name",
    attrs: &[col("role", Text), col("contribution", Text)],
};

pub static PROJECT_COMPANIES: LinkSpec = LinkSpec {
    table: "project_companies",
    a_table: "companies",
    a_fk: "company_id",
    b_fk: "project_id",
    a_select: &[
        ("name", "company_name"),
        ("country", "company_country"),
        ("type", "company_type"),
    ],
    a_display: "name",
    attrs: &[
        col("role", Text),
        col("contribution", Text),
        col("start_date", Date),
        col("end_date", Date),
    ],
};

pub static LINKS: &[&LinkSpec] = &[
    &EMPLOYEE_PATENTS,
    &EMPLOYEE_PROJECTS,
    &EMPLOYEE_PUBLICATIONS,
    &PROJECT_COMPANIES,
];
