//! MyBatis mapper XML declarations.
//!
//! A mapper document declares statements as direct children of its root:
//!
//! ```xml
//! <mapper namespace="com.example.UserMapper">
//!     <select id="selectById">...</select>
//! </mapper>
//! ```

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{SqlmarkError, SqlmarkResult};
use crate::logging::log_skipped;
use crate::statement::TargetStatement;

/// The SQL verb element a statement is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"select" => Some(Self::Select),
            b"insert" => Some(Self::Insert),
            b"update" => Some(Self::Update),
            b"delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A statement declared in a mapper file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredStatement {
    pub statement: TargetStatement,
    pub kind: StatementKind,
    pub file: PathBuf,
}

/// Unescaped value of attribute `name`; `None` when absent or blank.
fn attribute(path: &Path, element: &BytesStart<'_>, name: &str) -> SqlmarkResult<Option<String>> {
    let attr = element
        .try_get_attribute(name)
        .map_err(|e| SqlmarkError::mapper(path, format!("bad attribute '{}': {}", name, e)))?;
    let Some(attr) = attr else {
        return Ok(None);
    };
    let value = attr
        .unescape_value()
        .map_err(|e| SqlmarkError::mapper(path, format!("bad attribute '{}': {}", name, e)))?;
    Ok((!value.trim().is_empty()).then(|| value.into_owned()))
}

/// Statements declared by one mapper document.
///
/// XML whose root is not `<mapper>` is not a mapper and yields nothing.
/// Malformed XML is a [`SqlmarkError::Mapper`].
pub fn parse_mapper(path: &Path, content: &str) -> SqlmarkResult<Vec<DeclaredStatement>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut namespace: Option<String> = None;
    let mut statements = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            SqlmarkError::mapper(
                path,
                format!("at byte {}: {}", reader.error_position(), e),
            )
        })?;

        let (element, is_empty) = match &event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        match depth {
            0 => {
                if element.name().as_ref() != b"mapper" {
                    return Ok(Vec::new());
                }
                namespace = attribute(path, element, "namespace")?;
                if namespace.is_none() {
                    debug!(path = %path.display(), "mapper without namespace");
                    return Ok(Vec::new());
                }
            }
            1 => {
                if let (Some(kind), Some(ns)) =
                    (StatementKind::from_tag(element.name().as_ref()), &namespace)
                {
                    if let Some(id) = attribute(path, element, "id")? {
                        statements.push(DeclaredStatement {
                            statement: TargetStatement::new(ns.as_str(), id),
                            kind,
                            file: path.to_path_buf(),
                        });
                    }
                }
            }
            _ => {}
        }

        if !is_empty {
            depth += 1;
        }
    }

    Ok(statements)
}

/// Statements declared across `files`, in file order.
///
/// Files that cannot be read or parsed are logged and skipped.
pub fn discover_statements(files: &[PathBuf]) -> Vec<DeclaredStatement> {
    let per_file: Vec<Vec<DeclaredStatement>> = files
        .par_iter()
        .map(|path| {
            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    log_skipped(path, &e);
                    return Vec::new();
                }
            };
            parse_mapper(path, &content).unwrap_or_else(|e| {
                log_skipped(path, &e);
                Vec::new()
            })
        })
        .collect();

    let statements: Vec<DeclaredStatement> = per_file.into_iter().flatten().collect();
    debug!(files = files.len(), statements = statements.len(), "mapper statements discovered");
    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_MAPPER: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE mapper PUBLIC "-//mybatis.org//DTD Mapper 3.0//EN" "http://mybatis.org/dtd/mybatis-3-mapper.dtd">
<mapper namespace="com.example.UserMapper">
    <resultMap id="userMap" type="User"/>
    <sql id="columns">id, name</sql>
    <select id="selectById" resultMap="userMap">
        select <include refid="columns"/> from users where id = #{id} and age &lt; 10
    </select>
    <insert id="insertUser">insert into users values (#{id})</insert>
    <update id="updateName">update users set name = #{name}</update>
    <delete id="deleteAll"/>
    <select id="  ">select 1</select>
    <select>select 2</select>
</mapper>"#;

    fn ids(statements: &[DeclaredStatement]) -> Vec<(String, StatementKind)> {
        statements
            .iter()
            .map(|s| (s.statement.full_name(), s.kind))
            .collect()
    }

    #[test]
    fn test_parse_mapper_statements() {
        let found = parse_mapper(Path::new("UserMapper.xml"), USER_MAPPER).unwrap();
        assert_eq!(
            ids(&found),
            vec![
                ("com.example.UserMapper.selectById".to_string(), StatementKind::Select),
                ("com.example.UserMapper.insertUser".to_string(), StatementKind::Insert),
                ("com.example.UserMapper.updateName".to_string(), StatementKind::Update),
                ("com.example.UserMapper.deleteAll".to_string(), StatementKind::Delete),
            ]
        );
        assert!(found.iter().all(|s| s.file == Path::new("UserMapper.xml")));
    }

    #[test]
    fn test_nested_statements_ignored() {
        let xml = r#"<mapper namespace="ns"><sql id="a"><select id="inner"/></sql><select id="outer"/></mapper>"#;
        let found = parse_mapper(Path::new("m.xml"), xml).unwrap();
        assert_eq!(ids(&found), vec![("ns.outer".to_string(), StatementKind::Select)]);
    }

    #[test]
    fn test_non_mapper_xml_is_empty() {
        let pom = r#"<project><select id="x"/></project>"#;
        assert!(parse_mapper(Path::new("pom.xml"), pom).unwrap().is_empty());

        let blank_ns = r#"<mapper namespace=" "><select id="x"/></mapper>"#;
        assert!(parse_mapper(Path::new("m.xml"), blank_ns).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let broken = r#"<mapper namespace="ns"><select id="x"></update></mapper>"#;
        let err = parse_mapper(Path::new("bad.xml"), broken).unwrap_err();
        assert!(matches!(err, SqlmarkError::Mapper { .. }));
        assert_eq!(err.path(), Some(&PathBuf::from("bad.xml")));
    }

    #[test]
    fn test_attribute_values_kept_verbatim() {
        let xml = r#"<mapper namespace="ns "><select id=" padded"/><select id=" "/></mapper>"#;
        let found = parse_mapper(Path::new("m.xml"), xml).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].statement.namespace, "ns ");
        assert_eq!(found[0].statement.id, " padded");
        assert_eq!(found[0].statement.full_name(), "ns . padded");
    }

    #[test]
    fn test_unescaped_attribute() {
        let xml = r#"<mapper namespace="a&amp;b"><select id="x"/></mapper>"#;
        let found = parse_mapper(Path::new("m.xml"), xml).unwrap();
        assert_eq!(found[0].statement.namespace, "a&b");
    }

    #[test]
    fn test_discover_statements_skips_bad_files() {
        let dir = std::env::temp_dir().join(format!("sqlmark_mapper_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let good = dir.join("UserMapper.xml");
        let bad = dir.join("Broken.xml");
        fs::write(&good, USER_MAPPER).unwrap();
        fs::write(&bad, "<mapper namespace=\"x\"><select id=\"a\"></mapper>").unwrap();

        let found = discover_statements(&[bad, good.clone(), dir.join("Missing.xml")]);
        assert_eq!(found.len(), 4);
        assert!(found.iter().all(|s| s.file == good));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&StatementKind::Select).unwrap(), "\"select\"");
        assert_eq!(StatementKind::Delete.to_string(), "delete");
    }
}
