// @generated by docmap from `User`. Do not edit.

use docmap::runtime::{self as runtime, Document, DocumentShapeError};

pub fn from_user(doc: &Document) -> Result<User, DocumentShapeError> {
    Ok(User {
        id: runtime::read_strict::<String>(doc, "id")?,
        title: runtime::read_strict::<String>(doc, "title")?,
        amount: Some(runtime::read_or::<f64>(doc, "amount", 0.0)),
        tags: Some(runtime::read_or::<Vec<String>>(doc, "tags", Vec::new())),
        visits: runtime::read_or::<i64>(doc, "visits", 0),
        active: runtime::read_strict::<bool>(doc, "active")?,
        metadata: Some(runtime::read_or::<Document>(doc, "metadata", Document::new())),
        address: Default::default(),
    })
}

pub fn to_user_document(record: &User) -> Document {
    let mut doc = Document::new();
    doc.insert("id".to_owned(), runtime::to_value(&record.id));
    doc.insert("title".to_owned(), runtime::to_value(&record.title));
    doc.insert("amount".to_owned(), runtime::to_value(&record.amount));
    doc.insert("tags".to_owned(), runtime::to_value(&record.tags));
    doc.insert("visits".to_owned(), runtime::to_value(&record.visits));
    doc.insert("active".to_owned(), runtime::to_value(&record.active));
    doc.insert("metadata".to_owned(), runtime::to_value(&record.metadata));
    doc
}
