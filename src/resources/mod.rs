//! Resource registry: table metadata driving the generic CRUD engine.
//!
//! Every catalogue table is described once here — table name, primary key,
//! optional parent foreign key, and the column whitelist with types. The
//! repository and the route factory are parameterized over these specs, so
//! there is exactly one CRUD implementation for all ten resources.

pub mod handlers;
pub mod repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Number,
    Date,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

const fn col(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        required: false,
    }
}

const fn req(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        required: true,
    }
}

/// Who may read a resource. Writes are always employee-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAccess {
    Public,
    Authenticated,
}

#[derive(Debug)]
pub struct ResourceSpec {
    /// URL segment, e.g. `technologies` in `GET /technologies/:id`
    pub name: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    /// Foreign key for list-by-parent queries (`?tech_id=` on child tables)
    pub parent_key: Option<&'static str>,
    pub read_access: ReadAccess,
    pub columns: &'static [ColumnSpec],
}

use ColumnKind::{Date, Integer, Number, Text};

pub static TECHNOLOGIES: ResourceSpec = ResourceSpec {
    name: "technologies",
    table: "technologies",
    primary_key: "id",
    parent_key: None,
    read_access: ReadAccess::Public,
    columns: &[
        req("name", Text),
        col("category", Text),
        col("status", Text),
        col("production_start_date", Date),
        col("last_usage_date", Date),
        col("budget", Number),
        col("security_level", Text),
        col("trl_start", Integer),
        col("trl_achieved", Integer),
        col("description", Text),
        col("salient_features", Text),
        col("achievements", Text),
        col("tech_stack", Text),
    ],
};

pub static PROJECTS: ResourceSpec = ResourceSpec {
    name: "projects",
    table: "projects",
    primary_key: "id",
    parent_key: Some("tech_id"),
    read_access: ReadAccess::Public,
    columns: &[
        req("name", Text),
        col("description", Text),
        col("start_date", Date),
        // Null end_date means the project is ongoing
        col("end_date", Date),
        col("budget", Number),
        col("tech_id", Integer),
    ],
};

pub static PATENTS: ResourceSpec = ResourceSpec {
    name: "patents",
    table: "patents",
    primary_key: "id",
    parent_key: Some("tech_id"),
    read_access: ReadAccess::Public,
    columns: &[
        req("title", Text),
        req("patent_number", Text),
        col("date_filed", Date),
        // Null date_granted means the patent is still pending
        col("date_granted", Date),
        col("tech_id", Integer),
    ],
};

pub static PUBLICATIONS: ResourceSpec = ResourceSpec {
    name: "publications",
    table: "publications",
    primary_key: "id",
    parent_key: Some("tech_id"),
    read_access: ReadAccess::Public,
    columns: &[
        req("title", Text),
        col("authors", Text),
        col("journal", Text),
        col("year", Integer),
        col("link", Text),
        req("tech_id", Integer),
    ],
};

pub static COMPANIES: ResourceSpec = ResourceSpec {
    name: "companies",
    table: "companies",
    primary_key: "id",
    parent_key: None,
    read_access: ReadAccess::Public,
    columns: &[
        req("name", Text),
        col("country", Text),
        col("type", Text),
        col("role", Text),
        col("contact_person", Text),
        col("contact_email", Text),
        col("contact_phone", Text),
    ],
};

pub static EMPLOYEES: ResourceSpec = ResourceSpec {
    name: "employees",
    table: "employees",
    primary_key: "id",
    parent_key: None,
    read_access: ReadAccess::Public,
    columns: &[
        req("name", Text),
        col("designation", Text),
        col("department", Text),
        col("email", Text),
        col("phone", Text),
        col("status", Text),
        col("profile_image", Text),
    ],
};

pub static TECHNOLOGY_SPECS: ResourceSpec = ResourceSpec {
    name: "technology_specs",
    table: "technology_specs",
    primary_key: "id",
    parent_key: Some("tech_id"),
    read_access: ReadAccess::Authenticated,
    columns: &[
        req("tech_id", Integer),
        req("spec_name", Text),
        col("spec_value", Text),
        col("remarks", Text),
    ],
};

pub static QUALIFICATION_HW: ResourceSpec = ResourceSpec {
    name: "qualification_hw",
    table: "qualification_hw",
    primary_key: "id",
    parent_key: Some("tech_id"),
    read_access: ReadAccess::Authenticated,
    columns: &[
        req("tech_id", Integer),
        req("component", Text),
        col("test_name", Text),
        col("standard", Text),
        col("status", Text),
        col("test_date", Date),
    ],
};

pub static QUALIFICATION_SW: ResourceSpec = ResourceSpec {
    name: "qualification_sw",
    table: "qualification_sw",
    primary_key: "id",
    parent_key: Some("tech_id"),
    read_access: ReadAccess::Authenticated,
    columns: &[
        req("tech_id", Integer),
        req("module_name", Text),
        col("test_name", Text),
        col("standard", Text),
        col("status", Text),
        col("test_date", Date),
    ],
};

pub static VERSIONS: ResourceSpec = ResourceSpec {
    name: "versions",
    table: "versions",
    primary_key: "id",
    parent_key: Some("tech_id"),
    read_access: ReadAccess::Authenticated,
    columns: &[
        req("tech_id", Integer),
        req("version_name", Text),
        col("release_date", Date),
        col("changes", Text),
        col("status", Text),
    ],
};

pub static RESOURCES: &[&ResourceSpec] = &[
    &TECHNOLOGIES,
    &PROJECTS,
    &PATENTS,
    &PUBLICATIONS,
    &COMPANIES,
    &EMPLOYEES,
    &TECHNOLOGY_SPECS,
    &QUALIFICATION_HW,
    &QUALIFICATION_SW,
    &VERSIONS,
];

impl ResourceSpec {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Singular-ish label for error messages ("technologies" -> "technologies record")
    pub fn label(&self) -> &'static str {
        self.name
    }
}
