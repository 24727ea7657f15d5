/// Semantic role a header label can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Identifier,
    Name,
    Class,
    Date,
    Status,
    Time,
    School,
    DateOfBirth,
    FatherName,
    MotherName,
}

#[derive(Clone, Copy)]
struct RoleRule {
    role: ColumnRole,
    any_of: &'static [&'static str],
    none_of: &'static [&'static str],
}

impl ColumnRole {
    fn rule(self) -> RoleRule {
        match self {
            ColumnRole::Identifier => RoleRule {
                role: self,
                any_of: &["roll", "admission", "id"],
                none_of: &[],
            },
            ColumnRole::Name => RoleRule {
                role: self,
                any_of: &["name"],
                none_of: &["father", "mother"],
            },
            ColumnRole::Class => RoleRule {
                role: self,
                any_of: &["class"],
                none_of: &[],
            },
            ColumnRole::Date => RoleRule {
                role: self,
                any_of: &["date"],
                none_of: &[],
            },
            ColumnRole::Status => RoleRule {
                role: self,
                any_of: &["status", "present", "absent"],
                none_of: &[],
            },
            ColumnRole::Time => RoleRule {
                role: self,
                any_of: &["time", "late"],
                none_of: &[],
            },
            ColumnRole::School => RoleRule {
                role: self,
                any_of: &["school"],
                none_of: &[],
            },
            ColumnRole::DateOfBirth => RoleRule {
                role: self,
                any_of: &["dob", "birth"],
                none_of: &[],
            },
            ColumnRole::FatherName => RoleRule {
                role: self,
                any_of: &["father"],
                none_of: &[],
            },
            ColumnRole::MotherName => RoleRule {
                role: self,
                any_of: &["mother"],
                none_of: &[],
            },
        }
    }

    /// True when the label (any case) satisfies this role's keyword rule.
    pub fn matches(self, label: &str) -> bool {
        let rule = self.rule();
        let label = label.to_lowercase();
        rule.any_of.iter().any(|keyword| label.contains(keyword))
            && !rule.none_of.iter().any(|keyword| label.contains(keyword))
    }
}

/// First column, left to right, whose label matches `role`.
///
/// No check is made that the match is unique.
pub fn find_column<S: AsRef<str>>(header: &[S], role: ColumnRole) -> Option<usize> {
    header.iter().position(|label| role.matches(label.as_ref()))
}
