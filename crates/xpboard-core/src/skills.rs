//! Skill normalization: display names, best level per skill, ranking

use serde::Serialize;
use std::collections::HashMap;

use crate::models::SkillRecord;

const SKILL_PREFIX: &str = "skill_";

/// Skill codes with a fixed display name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownSkill {
    Prog,
    Go,
    BackEnd,
    FrontEnd,
    Js,
    Html,
    Css,
    Sql,
    Docker,
    Algo,
    Tcp,
    Unix,
    SysAdmin,
    Game,
}

impl KnownSkill {
    pub fn from_code(code: &str) -> Option<Self> {
        let skill = match code {
            "skill_prog" => KnownSkill::Prog,
            "skill_go" => KnownSkill::Go,
            "skill_back-end" => KnownSkill::BackEnd,
            "skill_front-end" => KnownSkill::FrontEnd,
            "skill_js" => KnownSkill::Js,
            "skill_html" => KnownSkill::Html,
            "skill_css" => KnownSkill::Css,
            "skill_sql" => KnownSkill::Sql,
            "skill_docker" => KnownSkill::Docker,
            "skill_algo" => KnownSkill::Algo,
            "skill_tcp" => KnownSkill::Tcp,
            "skill_unix" => KnownSkill::Unix,
            "skill_sys-admin" => KnownSkill::SysAdmin,
            "skill_game" => KnownSkill::Game,
            _ => return None,
        };
        Some(skill)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            KnownSkill::Prog => "Programming",
            KnownSkill::Go => "Golang",
            KnownSkill::BackEnd => "Back-End",
            KnownSkill::FrontEnd => "Front-End",
            KnownSkill::Js => "JavaScript",
            KnownSkill::Html => "HTML",
            KnownSkill::Css => "CSS",
            KnownSkill::Sql => "SQL",
            KnownSkill::Docker => "Docker",
            KnownSkill::Algo => "Algorithms",
            KnownSkill::Tcp => "TCP/IP",
            KnownSkill::Unix => "Unix/Linux",
            KnownSkill::SysAdmin => "System Admin",
            KnownSkill::Game => "Game Development",
        }
    }
}

/// Display name for any skill code
///
/// Unknown codes drop the `skill_` prefix and turn separators into spaces.
pub fn skill_display_name(code: &str) -> String {
    match KnownSkill::from_code(code) {
        Some(skill) => skill.display_name().to_string(),
        None => code
            .strip_prefix(SKILL_PREFIX)
            .unwrap_or(code)
            .replace(['-', '_'], " "),
    }
}

/// A ranked skill ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skill {
    pub code: String,
    pub name: String,
    pub level: i64,
}

/// Normalized skills, best first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkillSummary {
    pub all: Vec<Skill>,
}

impl SkillSummary {
    /// Number of skills shown in the summary card
    pub const TOP_COUNT: usize = 3;

    pub fn top(&self) -> &[Skill] {
        &self.all[..self.all.len().min(Self::TOP_COUNT)]
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

/// Collapse to the best level per code, name and rank
pub fn normalize_skills(records: &[SkillRecord]) -> SkillSummary {
    let mut best: HashMap<&str, i64> = HashMap::new();
    for record in records {
        best.entry(record.code.as_str())
            .and_modify(|level| *level = (*level).max(record.level))
            .or_insert(record.level);
    }

    let mut all: Vec<Skill> = best
        .into_iter()
        .map(|(code, level)| Skill {
            code: code.to_string(),
            name: skill_display_name(code),
            level,
        })
        .collect();

    all.sort_by(|a, b| b.level.cmp(&a.level).then_with(|| a.name.cmp(&b.name)));

    SkillSummary { all }
}
