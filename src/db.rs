use crate::model::{AcademicYear, Branch, PlacementStatus, StudentProfile, StudentRecord};
use crate::store::{RecordStore, StoreError, StoreScope};
use anyhow::Context;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;

pub const DB_FILE_NAME: &str = "registrar.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("create workspace {}", workspace.display()))?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("open {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            roll_no TEXT NOT NULL UNIQUE,
            date_of_birth TEXT NOT NULL,
            gender TEXT NOT NULL,
            enrollment_date TEXT NOT NULL,
            academic_year TEXT NOT NULL,
            branch TEXT NOT NULL,
            address TEXT,
            phone_number TEXT,
            email TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            parent_id INTEGER,
            cgpa REAL,
            backlogs INTEGER NOT NULL DEFAULT 0,
            internship_company TEXT,
            internship_status TEXT,
            project_title TEXT,
            project_guide TEXT,
            placement_status TEXT,
            placement_company TEXT,
            scholarship_status INTEGER NOT NULL DEFAULT 0,
            scholarship_details TEXT,
            hostel_resident INTEGER NOT NULL DEFAULT 0,
            hostel_room_number TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_branch ON students(branch)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_academic_year ON students(academic_year)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_parent_id ON students(parent_id)",
        [],
    )?;

    // Workspaces created before edit tracking have no updated_at column.
    ensure_students_updated_at(&conn)?;

    Ok(conn)
}

fn ensure_students_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "students", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE students ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

const STUDENT_COLUMNS: &str = "id, first_name, last_name, roll_no, date_of_birth, gender,
    enrollment_date, academic_year, branch, address, phone_number, email, is_active,
    parent_id, cgpa, backlogs, internship_company, internship_status, project_title,
    project_guide, placement_status, placement_company, scholarship_status,
    scholarship_details, hostel_resident, hostel_room_number";

/// A `students` row before the enum columns are decoded.
struct StudentRow {
    id: i64,
    first_name: String,
    last_name: String,
    roll_no: String,
    date_of_birth: NaiveDate,
    gender: String,
    enrollment_date: NaiveDate,
    academic_year: String,
    branch: String,
    address: Option<String>,
    phone_number: Option<String>,
    email: Option<String>,
    is_active: bool,
    parent_id: Option<i64>,
    cgpa: Option<f64>,
    backlogs: u32,
    internship_company: Option<String>,
    internship_status: Option<String>,
    project_title: Option<String>,
    project_guide: Option<String>,
    placement_status: Option<String>,
    placement_company: Option<String>,
    scholarship_status: bool,
    scholarship_details: Option<String>,
    hostel_resident: bool,
    hostel_room_number: Option<String>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<StudentRow> {
    Ok(StudentRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        roll_no: row.get(3)?,
        date_of_birth: row.get(4)?,
        gender: row.get(5)?,
        enrollment_date: row.get(6)?,
        academic_year: row.get(7)?,
        branch: row.get(8)?,
        address: row.get(9)?,
        phone_number: row.get(10)?,
        email: row.get(11)?,
        is_active: row.get(12)?,
        parent_id: row.get(13)?,
        cgpa: row.get(14)?,
        backlogs: row.get(15)?,
        internship_company: row.get(16)?,
        internship_status: row.get(17)?,
        project_title: row.get(18)?,
        project_guide: row.get(19)?,
        placement_status: row.get(20)?,
        placement_company: row.get(21)?,
        scholarship_status: row.get(22)?,
        scholarship_details: row.get(23)?,
        hostel_resident: row.get(24)?,
        hostel_room_number: row.get(25)?,
    })
}

impl StudentRow {
    fn into_record(self) -> Result<StudentRecord, StoreError> {
        let id = self.id;
        let Some(branch) = Branch::lookup(&self.branch) else {
            return Err(StoreError::Corrupt {
                id,
                column: "branch",
                value: self.branch,
            });
        };
        let Some(academic_year) = AcademicYear::lookup(&self.academic_year) else {
            return Err(StoreError::Corrupt {
                id,
                column: "academic_year",
                value: self.academic_year,
            });
        };
        let placement_status = match self.placement_status {
            None => None,
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => match PlacementStatus::parse(&raw) {
                Some(p) => Some(p),
                None => {
                    return Err(StoreError::Corrupt {
                        id,
                        column: "placement_status",
                        value: raw,
                    })
                }
            },
        };

        Ok(StudentRecord {
            id,
            profile: StudentProfile {
                first_name: self.first_name,
                last_name: self.last_name,
                roll_no: self.roll_no,
                date_of_birth: self.date_of_birth,
                gender: self.gender,
                enrollment_date: self.enrollment_date,
                academic_year,
                branch,
                address: self.address,
                phone_number: self.phone_number,
                email: self.email,
                is_active: self.is_active,
                parent_id: self.parent_id,
                cgpa: self.cgpa,
                backlogs: self.backlogs,
                internship_company: self.internship_company,
                internship_status: self.internship_status,
                project_title: self.project_title,
                project_guide: self.project_guide,
                placement_status,
                placement_company: self.placement_company,
                scholarship_status: self.scholarship_status,
                scholarship_details: self.scholarship_details,
                hostel_resident: self.hostel_resident,
                hostel_room_number: self.hostel_room_number,
            },
        })
    }
}

fn profile_values(p: &StudentProfile) -> Vec<Value> {
    fn opt_text(v: &Option<String>) -> Value {
        v.as_ref().map_or(Value::Null, |s| Value::Text(s.clone()))
    }
    vec![
        Value::Text(p.first_name.clone()),
        Value::Text(p.last_name.clone()),
        Value::Text(p.roll_no.clone()),
        Value::Text(p.date_of_birth.format("%Y-%m-%d").to_string()),
        Value::Text(p.gender.clone()),
        Value::Text(p.enrollment_date.format("%Y-%m-%d").to_string()),
        Value::Text(p.academic_year.symbol().to_string()),
        Value::Text(p.branch.symbol().to_string()),
        opt_text(&p.address),
        opt_text(&p.phone_number),
        opt_text(&p.email),
        Value::Integer(i64::from(p.is_active)),
        p.parent_id.map_or(Value::Null, Value::Integer),
        p.cgpa.map_or(Value::Null, Value::Real),
        Value::Integer(i64::from(p.backlogs)),
        opt_text(&p.internship_company),
        opt_text(&p.internship_status),
        opt_text(&p.project_title),
        opt_text(&p.project_guide),
        p.placement_status
            .map_or(Value::Null, |s| Value::Text(s.as_str().to_string())),
        opt_text(&p.placement_company),
        Value::Integer(i64::from(p.scholarship_status)),
        opt_text(&p.scholarship_details),
        Value::Integer(i64::from(p.hostel_resident)),
        opt_text(&p.hostel_room_number),
    ]
}

fn map_write_err(e: rusqlite::Error, roll_no: &str) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation => {
            StoreError::DuplicateRollNo(roll_no.to_string())
        }
        other => StoreError::Sqlite(other),
    }
}

/// Students kept in a workspace database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(open_db(workspace)?))
    }

    fn select(&self, where_sql: &str, bind: Vec<Value>) -> Result<Vec<StudentRecord>, StoreError> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students {where_sql} ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(bind), read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(StudentRow::into_record).collect()
    }

    fn select_one(
        &self,
        where_sql: &str,
        bind: Vec<Value>,
    ) -> Result<Option<StudentRecord>, StoreError> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students {where_sql}");
        let row = self
            .conn
            .query_row(&sql, params_from_iter(bind), read_row)
            .optional()?;
        row.map(StudentRow::into_record).transpose()
    }
}

impl RecordStore for SqliteStore {
    fn backend_tag(&self) -> &'static str {
        "sqlite"
    }

    fn fetch_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        self.select("", Vec::new())
    }

    fn fetch_scoped(&self, scope: &StoreScope) -> Result<Vec<StudentRecord>, StoreError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut bind: Vec<Value> = Vec::new();
        if let Some(b) = scope.branch {
            clauses.push("branch = ?");
            bind.push(Value::Text(b.symbol().to_string()));
        }
        if let Some(y) = scope.academic_year {
            clauses.push("academic_year = ?");
            bind.push(Value::Text(y.symbol().to_string()));
        }
        if let Some(status) = &scope.internship_status {
            clauses.push("internship_status = ? COLLATE NOCASE");
            bind.push(Value::Text(status.clone()));
        }
        if let Some(parent) = scope.parent_id {
            clauses.push("parent_id = ?");
            bind.push(Value::Integer(parent));
        }
        if clauses.is_empty() {
            return self.fetch_all();
        }
        self.select(&format!("WHERE {}", clauses.join(" AND ")), bind)
    }

    fn get(&self, id: i64) -> Result<Option<StudentRecord>, StoreError> {
        self.select_one("WHERE id = ?", vec![Value::Integer(id)])
    }

    fn get_by_roll_no(&self, roll_no: &str) -> Result<Option<StudentRecord>, StoreError> {
        self.select_one("WHERE roll_no = ?", vec![Value::Text(roll_no.to_string())])
    }

    fn insert(&mut self, profile: StudentProfile) -> Result<StudentRecord, StoreError> {
        let profile = profile.normalized().map_err(StoreError::Invalid)?;
        if self.get_by_roll_no(&profile.roll_no)?.is_some() {
            return Err(StoreError::DuplicateRollNo(profile.roll_no));
        }
        self.conn
            .execute(
                "INSERT INTO students(
                   first_name, last_name, roll_no, date_of_birth, gender,
                   enrollment_date, academic_year, branch, address, phone_number,
                   email, is_active, parent_id, cgpa, backlogs, internship_company,
                   internship_status, project_title, project_guide, placement_status,
                   placement_company, scholarship_status, scholarship_details,
                   hostel_resident, hostel_room_number, updated_at
                 ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                   strftime('%Y-%m-%dT%H:%M:%SZ','now'))",
                params_from_iter(profile_values(&profile)),
            )
            .map_err(|e| map_write_err(e, &profile.roll_no))?;
        let id = self.conn.last_insert_rowid();
        Ok(StudentRecord { id, profile })
    }

    fn update(
        &mut self,
        id: i64,
        profile: StudentProfile,
    ) -> Result<Option<StudentRecord>, StoreError> {
        let profile = profile.normalized().map_err(StoreError::Invalid)?;
        if self.get(id)?.is_none() {
            return Ok(None);
        }
        if let Some(other) = self.get_by_roll_no(&profile.roll_no)? {
            if other.id != id {
                return Err(StoreError::DuplicateRollNo(profile.roll_no));
            }
        }
        let mut bind = profile_values(&profile);
        bind.push(Value::Integer(id));
        self.conn
            .execute(
                "UPDATE students SET
                   first_name = ?, last_name = ?, roll_no = ?, date_of_birth = ?, gender = ?,
                   enrollment_date = ?, academic_year = ?, branch = ?, address = ?,
                   phone_number = ?, email = ?, is_active = ?, parent_id = ?, cgpa = ?,
                   backlogs = ?, internship_company = ?, internship_status = ?,
                   project_title = ?, project_guide = ?, placement_status = ?,
                   placement_company = ?, scholarship_status = ?, scholarship_details = ?,
                   hostel_resident = ?, hostel_room_number = ?,
                   updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now')
                 WHERE id = ?",
                params_from_iter(bind),
            )
            .map_err(|e| map_write_err(e, &profile.roll_no))?;
        Ok(Some(StudentRecord { id, profile }))
    }

    fn delete(&mut self, id: i64) -> Result<Option<StudentRecord>, StoreError> {
        let Some(existing) = self.get(id)? else {
            return Ok(None);
        };
        self.conn.execute("DELETE FROM students WHERE id = ?", [id])?;
        Ok(Some(existing))
    }
}
