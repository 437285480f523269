use crate::fixtures;
use crate::model::{AcademicYear, Branch, StudentProfile, StudentRecord};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a student with roll number {0} already exists")]
    DuplicateRollNo(String),
    #[error("invalid student: {0}")]
    Invalid(String),
    #[error("stored student {id} has an unreadable {column}: {value}")]
    Corrupt {
        id: i64,
        column: &'static str,
        value: String,
    },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::DuplicateRollNo(_) => "duplicate_roll_no",
            StoreError::Invalid(_) => "bad_params",
            StoreError::Corrupt { .. } | StoreError::Sqlite(_) => "db_query_failed",
        }
    }
}

/// Equality filters a backend may apply while scanning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreScope {
    pub branch: Option<Branch>,
    pub academic_year: Option<AcademicYear>,
    /// Whole-value match, ASCII case-insensitive.
    pub internship_status: Option<String>,
    pub parent_id: Option<i64>,
}

impl StoreScope {
    pub fn matches(&self, s: &StudentRecord) -> bool {
        self.branch.map_or(true, |b| s.profile.branch == b)
            && self
                .academic_year
                .map_or(true, |y| s.profile.academic_year == y)
            && self.internship_status.as_deref().map_or(true, |want| {
                s.profile
                    .internship_status
                    .as_deref()
                    .is_some_and(|have| have.eq_ignore_ascii_case(want))
            })
            && self
                .parent_id
                .map_or(true, |id| s.profile.parent_id == Some(id))
    }
}

/// Where student records live. Scans return records ordered by id.
pub trait RecordStore {
    fn backend_tag(&self) -> &'static str;

    fn fetch_all(&self) -> Result<Vec<StudentRecord>, StoreError>;

    fn fetch_scoped(&self, scope: &StoreScope) -> Result<Vec<StudentRecord>, StoreError> {
        let mut all = self.fetch_all()?;
        all.retain(|s| scope.matches(s));
        Ok(all)
    }

    fn get(&self, id: i64) -> Result<Option<StudentRecord>, StoreError>;

    fn get_by_roll_no(&self, roll_no: &str) -> Result<Option<StudentRecord>, StoreError>;

    fn insert(&mut self, profile: StudentProfile) -> Result<StudentRecord, StoreError>;

    fn update(
        &mut self,
        id: i64,
        profile: StudentProfile,
    ) -> Result<Option<StudentRecord>, StoreError>;

    fn delete(&mut self, id: i64) -> Result<Option<StudentRecord>, StoreError>;
}

/// In-memory store seeded with the demo students.
#[derive(Debug, Clone)]
pub struct FixtureStore {
    records: Vec<StudentRecord>,
    next_id: i64,
}

impl FixtureStore {
    pub fn with_records(records: Vec<StudentRecord>) -> Self {
        let mut records = records;
        records.sort_by_key(|s| s.id);
        let next_id = records.last().map(|s| s.id + 1).unwrap_or(1);
        Self { records, next_id }
    }

    pub fn demo() -> Self {
        Self::with_records(fixtures::demo_students())
    }

    fn roll_no_taken(&self, roll_no: &str, except_id: Option<i64>) -> bool {
        self.records
            .iter()
            .any(|s| s.profile.roll_no == roll_no && Some(s.id) != except_id)
    }
}

impl RecordStore for FixtureStore {
    fn backend_tag(&self) -> &'static str {
        "fixture"
    }

    fn fetch_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn get(&self, id: i64) -> Result<Option<StudentRecord>, StoreError> {
        Ok(self.records.iter().find(|s| s.id == id).cloned())
    }

    fn get_by_roll_no(&self, roll_no: &str) -> Result<Option<StudentRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .find(|s| s.profile.roll_no == roll_no)
            .cloned())
    }

    fn insert(&mut self, profile: StudentProfile) -> Result<StudentRecord, StoreError> {
        let profile = profile.normalized().map_err(StoreError::Invalid)?;
        if self.roll_no_taken(&profile.roll_no, None) {
            return Err(StoreError::DuplicateRollNo(profile.roll_no));
        }
        let record = StudentRecord {
            id: self.next_id,
            profile,
        };
        self.next_id += 1;
        self.records.push(record.clone());
        Ok(record)
    }

    fn update(
        &mut self,
        id: i64,
        profile: StudentProfile,
    ) -> Result<Option<StudentRecord>, StoreError> {
        let profile = profile.normalized().map_err(StoreError::Invalid)?;
        let Some(pos) = self.records.iter().position(|s| s.id == id) else {
            return Ok(None);
        };
        if self.roll_no_taken(&profile.roll_no, Some(id)) {
            return Err(StoreError::DuplicateRollNo(profile.roll_no));
        }
        self.records[pos].profile = profile;
        Ok(Some(self.records[pos].clone()))
    }

    fn delete(&mut self, id: i64) -> Result<Option<StudentRecord>, StoreError> {
        let Some(pos) = self.records.iter().position(|s| s.id == id) else {
            return Ok(None);
        };
        Ok(Some(self.records.remove(pos)))
    }
}
