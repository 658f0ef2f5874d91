//! C2: resolve a tabular source's header list into an ordered [`Layout`] (§4.2).

use crate::errors::{Error, LayoutError};

/// One declared node-level column: `(level, type_name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLevel {
    pub level: i32,
    pub type_name: String,
}

/// A raw header tag, as produced by whatever parses the source file's header
/// row (CSV/XLSX header text, or the `Nodes`/`Attributes`/`ProfessionColumn`
/// fields of the JSON layout object in §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderTag {
    Node { level: i32, name: String },
    Profession { name: String },
    Attribute { name: String },
}

/// Resolved layout: ordered node levels, the attribute column set, and the
/// optional profession column (§4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub node_levels: Vec<NodeLevel>,
    pub attribute_types: Vec<String>,
    pub profession_column: Option<String>,
}

impl Layout {
    /// Resolves `tags` into a [`Layout`], enforcing the rules in §4.2.
    /// `is_master` gates the profession-column requirements that only apply
    /// to master taxonomies.
    pub fn resolve(tags: &[HeaderTag], is_master: bool) -> Result<Layout, Error> {
        let mut node_levels: Vec<NodeLevel> = Vec::new();
        let mut attribute_types: Vec<String> = Vec::new();
        let mut profession_column: Option<String> = None;

        for tag in tags {
            match tag {
                HeaderTag::Node { level, name } => {
                    if node_levels.iter().any(|n| n.level == *level) {
                        return Err(LayoutError::DuplicateLevel(*level).into());
                    }
                    node_levels.push(NodeLevel { level: *level, type_name: name.clone() });
                }
                HeaderTag::Attribute { name } => attribute_types.push(name.clone()),
                HeaderTag::Profession { name } => {
                    if profession_column.is_some() {
                        return Err(LayoutError::Invalid("more than one profession column declared".to_string()).into());
                    }
                    profession_column = Some(name.clone());
                }
            }
        }

        node_levels.sort_by_key(|n| n.level);

        if is_master {
            let Some(profession) = &profession_column else {
                return Err(LayoutError::ProfessionColumnMissing.into());
            };
            if !attribute_types.iter().any(|a| a == profession) {
                return Err(LayoutError::ProfessionColumnNotAttribute(profession.clone()).into());
            }
        } else if node_levels.is_empty() {
            // Flat customer profession list: the profession column defines a
            // single implicit level-1 node per row.
            let Some(profession) = &profession_column else {
                return Err(LayoutError::Invalid("customer layout has no node levels and no profession column".to_string()).into());
            };
            node_levels.push(NodeLevel { level: 1, type_name: profession.clone() });
        }

        Ok(Layout { node_levels, attribute_types, profession_column })
    }

    /// True when this layout was resolved from a flat profession list (no
    /// explicit node-level headers; the profession column stands in for one).
    pub fn is_implicit_flat(&self) -> bool {
        self.node_levels.len() == 1
            && self.profession_column.as_deref() == Some(self.node_levels[0].type_name.as_str())
    }

    pub fn type_name_for_level(&self, level: i32) -> Option<&str> {
        self.node_levels.iter().find(|n| n.level == level).map(|n| n.type_name.as_str())
    }
}

/// Parses one spreadsheet header cell into its [`HeaderTag`] (§4.2): `"Name
/// (Node k)"`, `"Name (Profession)"`, or `"Name (Attribute)"`, tag
/// case-insensitive, trailing whitespace around the name trimmed.
pub fn parse_header(header: &str) -> Result<HeaderTag, Error> {
    let node_re = regex::Regex::new(r"(?i)^(.*?)\s*\(\s*node\s+(\d+)\s*\)$").expect("valid regex");
    let profession_re = regex::Regex::new(r"(?i)^(.*?)\s*\(\s*profession\s*\)$").expect("valid regex");
    let attribute_re = regex::Regex::new(r"(?i)^(.*?)\s*\(\s*attribute\s*\)$").expect("valid regex");

    if let Some(caps) = node_re.captures(header) {
        let level: i32 = caps[2].parse().map_err(|_| LayoutError::Invalid(format!("header '{header}' has a non-numeric node level")))?;
        return Ok(HeaderTag::Node { level, name: caps[1].to_string() });
    }
    if let Some(caps) = profession_re.captures(header) {
        return Ok(HeaderTag::Profession { name: caps[1].to_string() });
    }
    if let Some(caps) = attribute_re.captures(header) {
        return Ok(HeaderTag::Attribute { name: caps[1].to_string() });
    }

    Err(LayoutError::Invalid(format!("header '{header}' is not tagged (Node k)/(Profession)/(Attribute)")).into())
}

/// The column name a [`HeaderTag`] carries, independent of its variant.
pub fn tag_name(tag: &HeaderTag) -> &str {
    match tag {
        HeaderTag::Node { name, .. } => name,
        HeaderTag::Profession { name } => name,
        HeaderTag::Attribute { name } => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(level: i32, name: &str) -> HeaderTag {
        HeaderTag::Node { level, name: name.to_string() }
    }

    #[test]
    fn parses_tagged_headers() {
        assert_eq!(parse_header("Industry (Node 0)").unwrap(), HeaderTag::Node { level: 0, name: "Industry".to_string() });
        assert_eq!(parse_header("Profession (Profession)").unwrap(), HeaderTag::Profession { name: "Profession".to_string() });
        assert_eq!(parse_header("State (Attribute)").unwrap(), HeaderTag::Attribute { name: "State".to_string() });
    }

    #[test]
    fn untagged_header_is_invalid() {
        let err = parse_header("Record Id").unwrap_err();
        assert!(matches!(err, Error::Layout(LayoutError::Invalid(_))));
    }

    #[test]
    fn resolves_master_layout_with_profession_as_attribute() {
        let tags = vec![
            node(0, "Industry"),
            node(1, "Profession Group"),
            HeaderTag::Attribute { name: "Profession".to_string() },
            HeaderTag::Profession { name: "Profession".to_string() },
        ];
        let layout = Layout::resolve(&tags, true).unwrap();
        assert_eq!(layout.node_levels.len(), 2);
        assert_eq!(layout.profession_column.as_deref(), Some("Profession"));
    }

    #[test]
    fn master_layout_without_profession_column_fails() {
        let tags = vec![node(0, "Industry")];
        let err = Layout::resolve(&tags, true).unwrap_err();
        assert!(matches!(err, Error::Layout(LayoutError::ProfessionColumnMissing)));
    }

    #[test]
    fn master_profession_column_must_also_be_an_attribute() {
        let tags = vec![node(0, "Industry"), HeaderTag::Profession { name: "Profession".to_string() }];
        let err = Layout::resolve(&tags, true).unwrap_err();
        assert!(matches!(err, Error::Layout(LayoutError::ProfessionColumnNotAttribute(_))));
    }

    #[test]
    fn duplicate_level_fails() {
        let tags = vec![node(0, "Industry"), node(0, "Other")];
        let err = Layout::resolve(&tags, false).unwrap_err();
        assert!(matches!(err, Error::Layout(LayoutError::DuplicateLevel(0))));
    }

    #[test]
    fn node_levels_sort_ascending_regardless_of_header_order() {
        let tags = vec![node(2, "C"), node(0, "A"), node(1, "B")];
        let layout = Layout::resolve(&tags, false).unwrap();
        assert_eq!(
            layout.node_levels.iter().map(|n| n.level).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn flat_customer_layout_gets_implicit_level_one() {
        let tags = vec![HeaderTag::Profession { name: "Profession".to_string() }];
        let layout = Layout::resolve(&tags, false).unwrap();
        assert_eq!(layout.node_levels, vec![NodeLevel { level: 1, type_name: "Profession".to_string() }]);
        assert!(layout.is_implicit_flat());
    }

    #[test]
    fn flat_customer_layout_without_profession_column_fails() {
        let err = Layout::resolve(&[], false).unwrap_err();
        assert!(matches!(err, Error::Layout(LayoutError::Invalid(_))));
    }
}
