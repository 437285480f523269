use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Engineering disciplines a student can be enrolled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branch {
    #[serde(rename = "CSE")]
    Cse,
    #[serde(rename = "ECE")]
    Ece,
    #[serde(rename = "EEE")]
    Eee,
    #[serde(rename = "ME")]
    Me,
    #[serde(rename = "CE")]
    Ce,
    #[serde(rename = "IT")]
    It,
    #[serde(rename = "AI_ML")]
    AiMl,
    #[serde(rename = "DS")]
    Ds,
    #[serde(rename = "IOT")]
    Iot,
    #[serde(rename = "ROBOTICS")]
    Robotics,
}

impl Branch {
    pub const ALL: [Branch; 10] = [
        Branch::Cse,
        Branch::Ece,
        Branch::Eee,
        Branch::Me,
        Branch::Ce,
        Branch::It,
        Branch::AiMl,
        Branch::Ds,
        Branch::Iot,
        Branch::Robotics,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Branch::Cse => "CSE",
            Branch::Ece => "ECE",
            Branch::Eee => "EEE",
            Branch::Me => "ME",
            Branch::Ce => "CE",
            Branch::It => "IT",
            Branch::AiMl => "AI_ML",
            Branch::Ds => "DS",
            Branch::Iot => "IOT",
            Branch::Robotics => "ROBOTICS",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Branch::Cse => "Computer Science and Engineering",
            Branch::Ece => "Electronics and Communication Engineering",
            Branch::Eee => "Electrical and Electronics Engineering",
            Branch::Me => "Mechanical Engineering",
            Branch::Ce => "Civil Engineering",
            Branch::It => "Information Technology",
            Branch::AiMl => "Artificial Intelligence and Machine Learning",
            Branch::Ds => "Data Science",
            Branch::Iot => "Internet of Things",
            Branch::Robotics => "Robotics and Automation",
        }
    }

    /// Resolves a symbol (`CSE`) or full label, ignoring ASCII case.
    pub fn lookup(raw: &str) -> Option<Self> {
        let t = raw.trim();
        Self::ALL
            .into_iter()
            .find(|b| b.symbol().eq_ignore_ascii_case(t) || b.label().eq_ignore_ascii_case(t))
    }
}

/// Enrollment stage. Variant order is the academic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AcademicYear {
    #[serde(rename = "FIRST_YEAR")]
    First,
    #[serde(rename = "SECOND_YEAR")]
    Second,
    #[serde(rename = "THIRD_YEAR")]
    Third,
    #[serde(rename = "FINAL_YEAR")]
    Final,
}

impl AcademicYear {
    pub const ALL: [AcademicYear; 4] = [
        AcademicYear::First,
        AcademicYear::Second,
        AcademicYear::Third,
        AcademicYear::Final,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            AcademicYear::First => "FIRST_YEAR",
            AcademicYear::Second => "SECOND_YEAR",
            AcademicYear::Third => "THIRD_YEAR",
            AcademicYear::Final => "FINAL_YEAR",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AcademicYear::First => "First Year",
            AcademicYear::Second => "Second Year",
            AcademicYear::Third => "Third Year",
            AcademicYear::Final => "Final Year",
        }
    }

    pub fn lookup(raw: &str) -> Option<Self> {
        let t = raw.trim();
        Self::ALL
            .into_iter()
            .find(|y| y.symbol().eq_ignore_ascii_case(t) || y.label().eq_ignore_ascii_case(t))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementStatus {
    Placed,
    #[serde(rename = "Not Placed")]
    NotPlaced,
}

impl PlacementStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlacementStatus::Placed => "Placed",
            PlacementStatus::NotPlaced => "Not Placed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Placed" => Some(PlacementStatus::Placed),
            "Not Placed" => Some(PlacementStatus::NotPlaced),
            _ => None,
        }
    }
}

/// Everything about a student except the store-assigned id. Keys outside
/// this set are rejected so a misspelt field never reads as "unchanged".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StudentProfile {
    pub first_name: String,
    pub last_name: String,
    pub roll_no: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub enrollment_date: NaiveDate,
    pub academic_year: AcademicYear,
    pub branch: Branch,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub cgpa: Option<f64>,
    #[serde(default)]
    pub backlogs: u32,
    #[serde(default)]
    pub internship_company: Option<String>,
    #[serde(default)]
    pub internship_status: Option<String>,
    #[serde(default)]
    pub project_title: Option<String>,
    #[serde(default)]
    pub project_guide: Option<String>,
    #[serde(default)]
    pub placement_status: Option<PlacementStatus>,
    #[serde(default)]
    pub placement_company: Option<String>,
    #[serde(default)]
    pub scholarship_status: bool,
    #[serde(default)]
    pub scholarship_details: Option<String>,
    #[serde(default)]
    pub hostel_resident: bool,
    #[serde(default)]
    pub hostel_room_number: Option<String>,
}

fn default_true() -> bool {
    true
}

fn clean_opt(v: Option<String>) -> Option<String> {
    v.and_then(|s| {
        let t = s.trim().to_string();
        if t.is_empty() {
            None
        } else {
            Some(t)
        }
    })
}

impl StudentProfile {
    /// Trims text fields and checks the value ranges stores rely on.
    /// Returns the normalized profile or a human-readable reason.
    pub fn normalized(mut self) -> Result<Self, String> {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.roll_no = self.roll_no.trim().to_string();
        self.gender = self.gender.trim().to_string();
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return Err("firstName/lastName must not be empty".into());
        }
        if self.roll_no.is_empty() {
            return Err("rollNo must not be empty".into());
        }
        if let Some(c) = self.cgpa {
            if !c.is_finite() || !(0.0..=10.0).contains(&c) {
                return Err(format!("cgpa must be between 0 and 10, got {c}"));
            }
        }

        self.address = clean_opt(self.address.take());
        self.phone_number = clean_opt(self.phone_number.take());
        self.email = clean_opt(self.email.take());
        self.internship_company = clean_opt(self.internship_company.take());
        self.internship_status = clean_opt(self.internship_status.take());
        self.project_title = clean_opt(self.project_title.take());
        self.project_guide = clean_opt(self.project_guide.take());
        self.placement_company = clean_opt(self.placement_company.take());
        self.scholarship_details = clean_opt(self.scholarship_details.take());
        self.hostel_room_number = clean_opt(self.hostel_room_number.take());
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: i64,
    #[serde(flatten)]
    pub profile: StudentProfile,
}

impl StudentRecord {
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.profile.last_name, self.profile.first_name)
    }

    /// The text fields a free-text search looks at, absent ones skipped.
    pub fn searchable_fields(&self) -> impl Iterator<Item = &str> {
        let p = &self.profile;
        [
            Some(p.first_name.as_str()),
            Some(p.last_name.as_str()),
            Some(p.roll_no.as_str()),
            p.email.as_deref(),
            p.project_title.as_deref(),
            p.internship_company.as_deref(),
            p.placement_company.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_lookup_accepts_symbol_and_label() {
        assert_eq!(Branch::lookup("CSE"), Some(Branch::Cse));
        assert_eq!(Branch::lookup("ai_ml"), Some(Branch::AiMl));
        assert_eq!(
            Branch::lookup("Mechanical Engineering"),
            Some(Branch::Me)
        );
        assert_eq!(Branch::lookup("ASTRONOMY"), None);
        assert_eq!(Branch::lookup(""), None);
    }

    #[test]
    fn profile_rejects_unknown_keys() {
        let mut raw = serde_json::to_value(&crate::fixtures::demo_students()[0].profile)
            .expect("serialize profile");
        assert!(serde_json::from_value::<StudentProfile>(raw.clone()).is_ok());

        raw["cgpaa"] = serde_json::json!(3.0);
        let e = serde_json::from_value::<StudentProfile>(raw).expect_err("unknown key");
        assert!(e.to_string().contains("cgpaa"), "{e}");
    }

    #[test]
    fn academic_years_are_ordered() {
        assert!(AcademicYear::First < AcademicYear::Second);
        assert!(AcademicYear::Third < AcademicYear::Final);
        assert_eq!(AcademicYear::lookup("final year"), Some(AcademicYear::Final));
        assert_eq!(AcademicYear::lookup("FIFTH_YEAR"), None);
    }

    #[test]
    fn profile_serializes_with_symbols() {
        let raw = serde_json::json!({
            "firstName": "  Meera ",
            "lastName": "Iyer",
            "rollNo": "DS2024003",
            "dateOfBirth": "2005-01-30",
            "gender": "Female",
            "enrollmentDate": "2024-08-01",
            "academicYear": "FIRST_YEAR",
            "branch": "DS",
            "email": "   ",
            "placementStatus": "Not Placed"
        });
        let profile: StudentProfile = serde_json::from_value(raw).expect("parse profile");
        let profile = profile.normalized().expect("valid profile");
        assert_eq!(profile.first_name, "Meera");
        assert_eq!(profile.email, None);
        assert!(profile.is_active);
        assert_eq!(profile.backlogs, 0);

        let v = serde_json::to_value(&profile).expect("serialize");
        assert_eq!(v["branch"], "DS");
        assert_eq!(v["academicYear"], "FIRST_YEAR");
        assert_eq!(v["placementStatus"], "Not Placed");
    }

    #[test]
    fn normalized_rejects_out_of_range_cgpa() {
        let raw = serde_json::json!({
            "firstName": "A",
            "lastName": "B",
            "rollNo": "X1",
            "dateOfBirth": "2005-01-30",
            "gender": "Male",
            "enrollmentDate": "2024-08-01",
            "academicYear": "FIRST_YEAR",
            "branch": "CE",
            "cgpa": 10.5
        });
        let profile: StudentProfile = serde_json::from_value(raw).expect("parse profile");
        assert!(profile.normalized().is_err());
    }
}
