use crate::model::{AcademicYear, Branch, PlacementStatus, StudentProfile, StudentRecord};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn text(s: &str) -> Option<String> {
    Some(s.to_string())
}

/// Demo students served when no workspace database is open.
pub fn demo_students() -> Vec<StudentRecord> {
    vec![
        StudentRecord {
            id: 1,
            profile: StudentProfile {
                first_name: "Sahana".into(),
                last_name: "Patel".into(),
                roll_no: "CSE2023001".into(),
                date_of_birth: date(2003, 5, 15),
                gender: "Female".into(),
                enrollment_date: date(2023, 8, 1),
                academic_year: AcademicYear::Second,
                branch: Branch::Cse,
                address: text("123 College Road, Bangalore"),
                phone_number: text("9876543210"),
                email: text("sahana.patel@example.com"),
                is_active: true,
                parent_id: Some(3),
                cgpa: Some(8.7),
                backlogs: 0,
                internship_company: text("TechSolutions Inc."),
                internship_status: text("Ongoing"),
                project_title: text("AI-based Attendance System"),
                project_guide: text("Dr. Sharma"),
                placement_status: None,
                placement_company: None,
                scholarship_status: true,
                scholarship_details: text("Merit Scholarship - 50% tuition waiver"),
                hostel_resident: true,
                hostel_room_number: text("G-204"),
            },
        },
        StudentRecord {
            id: 2,
            profile: StudentProfile {
                first_name: "Rahul".into(),
                last_name: "Kumar".into(),
                roll_no: "ECE2022042".into(),
                date_of_birth: date(2002, 8, 22),
                gender: "Male".into(),
                enrollment_date: date(2022, 8, 1),
                academic_year: AcademicYear::Third,
                branch: Branch::Ece,
                address: text("456 Engineering Avenue, Chennai"),
                phone_number: text("8765432109"),
                email: text("rahul.kumar@example.com"),
                is_active: true,
                parent_id: None,
                cgpa: Some(9.2),
                backlogs: 0,
                internship_company: text("ElectroTech Ltd."),
                internship_status: text("Completed"),
                project_title: text("IoT-based Smart Home System"),
                project_guide: text("Prof. Verma"),
                placement_status: Some(PlacementStatus::Placed),
                placement_company: text("Qualcomm"),
                scholarship_status: true,
                scholarship_details: text("Academic Excellence Scholarship"),
                hostel_resident: true,
                hostel_room_number: text("B-108"),
            },
        },
        StudentRecord {
            id: 3,
            profile: StudentProfile {
                first_name: "Priya".into(),
                last_name: "Singh".into(),
                roll_no: "IT2023015".into(),
                date_of_birth: date(2004, 3, 10),
                gender: "Female".into(),
                enrollment_date: date(2023, 8, 1),
                academic_year: AcademicYear::First,
                branch: Branch::It,
                address: text("789 Tech Park, Hyderabad"),
                phone_number: text("7654321098"),
                email: text("priya.singh@example.com"),
                is_active: true,
                parent_id: None,
                cgpa: Some(8.5),
                backlogs: 1,
                internship_company: None,
                internship_status: text("Not Started"),
                project_title: text("Web-based Student Management System"),
                project_guide: text("Dr. Gupta"),
                placement_status: None,
                placement_company: None,
                scholarship_status: false,
                scholarship_details: None,
                hostel_resident: false,
                hostel_room_number: None,
            },
        },
        StudentRecord {
            id: 4,
            profile: StudentProfile {
                first_name: "Arjun".into(),
                last_name: "Reddy".into(),
                roll_no: "ME2021007".into(),
                date_of_birth: date(2001, 11, 5),
                gender: "Male".into(),
                enrollment_date: date(2021, 8, 1),
                academic_year: AcademicYear::Final,
                branch: Branch::Me,
                address: text("101 Engineering Block, Mumbai"),
                phone_number: text("6543210987"),
                email: text("arjun.reddy@example.com"),
                is_active: true,
                parent_id: None,
                cgpa: Some(7.8),
                backlogs: 2,
                internship_company: text("AutoTech Industries"),
                internship_status: text("Completed"),
                project_title: text("Design and Analysis of Composite Materials"),
                project_guide: text("Prof. Rao"),
                placement_status: Some(PlacementStatus::NotPlaced),
                placement_company: None,
                scholarship_status: false,
                scholarship_details: None,
                hostel_resident: true,
                hostel_room_number: text("A-305"),
            },
        },
    ]
}
