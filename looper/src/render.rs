//! JSON views of finalized records for the rendering stage.

use serde_json::{Map, Value, json};

use crate::core::record::{FileRecord, Meta, RecordId};
use crate::core::registry::FileSet;

impl FileSet {
    /// The template context for one record.
    ///
    /// References are expanded one level deep (`name`, `type`, `data`);
    /// references inside the expansion collapse to the target's name. Index
    /// groups list record names in their sorted order.
    pub fn context(&self, id: RecordId) -> Option<Value> {
        let record = self.record(id)?;
        let data: Map<String, Value> = record
            .meta
            .iter()
            .map(|(key, meta)| (key.clone(), self.expand(meta)))
            .collect();
        Some(json!({
            "name": record.name,
            "type": record.kind,
            "layout": record.layout,
            "is_content": record.is_content,
            "size": record.contents.as_ref().map_or(0, Vec::len),
            "data": data,
            "indexes": self.index_names(record),
            "self": record.name,
        }))
    }

    /// Contexts for every record, in registry order.
    pub fn manifest(&self) -> Value {
        Value::Array(
            self.iter()
                .filter_map(|(_, record)| self.context(record.id()?))
                .collect(),
        )
    }

    fn expand(&self, meta: &Meta) -> Value {
        match meta {
            Meta::Value(value) => value.clone(),
            Meta::Ref(reference) => match self.record(reference.target) {
                Some(target) => json!({
                    "name": target.name,
                    "type": target.kind,
                    "data": shallow_data(target),
                }),
                None => reference.value.clone(),
            },
        }
    }

    fn index_names(&self, record: &FileRecord) -> Value {
        let Some(snapshot) = record.indexes() else {
            return Value::Object(Map::new());
        };
        let indexes: Map<String, Value> = snapshot
            .iter()
            .map(|(name, groups)| {
                let groups: Map<String, Value> = groups
                    .iter()
                    .map(|(key, ids)| {
                        let names = ids
                            .iter()
                            .filter_map(|id| self.record(*id))
                            .map(|r| Value::String(r.name.clone()))
                            .collect();
                        (key.clone(), Value::Array(names))
                    })
                    .collect();
                (name.to_string(), Value::Object(groups))
            })
            .collect();
        Value::Object(indexes)
    }
}

fn shallow_data(record: &FileRecord) -> Map<String, Value> {
    record
        .meta
        .iter()
        .map(|(key, meta)| {
            let value = match meta {
                Meta::Value(value) => value.clone(),
                Meta::Ref(reference) => Value::String(reference.key.clone()),
            };
            (key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify::PassConfig;
    use crate::pass::run_pass;
    use crate::test_support::{file_set, raw};

    #[test]
    fn context_expands_references_and_indexes() {
        let (post, record) = raw("blog/a.html", "hello");
        let mut files = file_set(vec![
            (post, record.with("author", "ann").with("date", 1)),
            raw("authors/ann.html", ""),
        ]);
        run_pass(
            &mut files,
            &PassConfig::default(),
            |plugin| {
                plugin.declare_index("recent", "date", false);
                plugin
                    .loop_on_type("blog", |file| {
                        file.add_reference("author", "authors")?;
                        file.add_index("recent", "all")
                    })
                    .map(|_| ())
            },
            |_| {},
        )
        .expect("pass");

        let id = files.id_of("blog/a.html").expect("id");
        let context = files.context(id).expect("context");
        assert_eq!(context["type"], json!("blog"));
        assert_eq!(context["layout"], json!("blog.njk"));
        assert_eq!(context["size"], json!(5));
        assert_eq!(context["self"], json!("blog/a.html"));
        assert_eq!(context["data"]["author"]["name"], json!("authors/ann.html"));
        assert_eq!(context["indexes"]["recent"]["all"], json!(["blog/a.html"]));
    }

    #[test]
    fn manifest_lists_records_in_registry_order() {
        let mut files = file_set(vec![raw("b.html", ""), raw("a.css", "")]);
        run_pass(&mut files, &PassConfig::default(), |_| Ok(()), |_| {}).expect("pass");
        let names: Vec<Value> = files
            .manifest()
            .as_array()
            .expect("array")
            .iter()
            .map(|entry| entry["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("b.html"), json!("a.css")]);
    }
}
