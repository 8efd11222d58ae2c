//! Roster Topic Catalog
//! The fixed set of course topics, their sub-projects, and org repositories

/// Teams are formed from every three students registered in a topic.
pub const TEAM_SIZE: usize = 3;

/// One topic track: its three sub-projects (assigned by position-in-team)
/// and the org repository its teams get access to.
#[derive(Debug, Clone, Copy)]
pub struct TopicEntry {
    pub name: &'static str,
    pub sub_projects: [&'static str; TEAM_SIZE],
    pub repo: &'static str,
}

pub static TOPICS: [TopicEntry; 6] = [
    TopicEntry {
        name: "Group_01_Computer_Vision",
        sub_projects: [
            "Student_A_Pothole_Detector",
            "Student_B_Cocoa_Pod_Counter",
            "Student_C_Cassava_Disease_Classifier",
        ],
        repo: "M2-IA-Group_01_Computer_Vision",
    },
    TopicEntry {
        name: "Group_02_NLP",
        sub_projects: [
            "Student_A_Pidgin_Translator",
            "Student_B_Yemba_Autocorrect",
            "Student_C_Dschang_Chatbot",
        ],
        repo: "M2-IA-Group_02_NLP",
    },
    TopicEntry {
        name: "Group_03_Time_Series",
        sub_projects: [
            "Student_A_Market_Forecaster",
            "Student_B_Electricity_Predictor",
            "Student_C_Student_Success",
        ],
        repo: "M2-IA-Group_03_Time_Series",
    },
    TopicEntry {
        name: "Group_04_Audio_Processing",
        sub_projects: [
            "Student_A_Dialect_Keyword_Spotter",
            "Student_B_Logging_Detector",
            "Student_C_Cameroonian_ASR",
        ],
        repo: "M2-IA-Group_04_Audio_Processing",
    },
    TopicEntry {
        name: "Group_05_Agentic_AI",
        sub_projects: [
            "Student_A_MoMo_Agent",
            "Student_B_Penal_Code_Assistant",
            "Student_C_Tour_Guide",
        ],
        repo: "M2-IA-Group_05_Agentic_AI",
    },
    TopicEntry {
        name: "Group_06_MLOps",
        sub_projects: [
            "Student_A_Feature_Store",
            "Student_B_Experiment_Tracker",
            "Student_C_Data_Validator",
        ],
        repo: "M2-IA-Group_06_MLOps",
    },
];

/// Look up a topic by its exact name.
pub fn find(name: &str) -> Option<&'static TopicEntry> {
    TOPICS.iter().find(|t| t.name == name)
}

/// All topic names, in catalog order.
pub fn names() -> impl Iterator<Item = &'static str> {
    TOPICS.iter().map(|t| t.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_known_topic() {
        let topic = find("Group_02_NLP").unwrap();
        assert_eq!(topic.repo, "M2-IA-Group_02_NLP");
        assert_eq!(topic.sub_projects[2], "Student_C_Dschang_Chatbot");
    }

    #[test]
    fn test_find_unknown_topic() {
        assert!(find("Group_99_Quantum").is_none());
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = names().collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), TOPICS.len());
    }
}
