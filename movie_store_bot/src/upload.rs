use bot_commons::useful_methods::{FileKind, UploadedFile};
use chrono::{DateTime, Utc};

use crate::{
    database::Database,
    error::Error,
    types::{MediaRecord, NewMedia},
};

/// Display name from a file name: `My_Movie.2023.mkv` becomes `My Movie 2023 mkv`.
pub fn clean_name(file_name: &str) -> String {
    file_name.replace(['_', '.'], " ")
}

/// Store an uploaded file under a new short ID.
pub async fn store_upload(
    database: &Database,
    upload: &UploadedFile<'_>,
    now: DateTime<Utc>,
) -> Result<MediaRecord, Error> {
    let file_name = upload.file_name.unwrap_or(match upload.kind {
        FileKind::Document => "Unknown Document",
        FileKind::Video => "Unknown Video",
    });

    let media = NewMedia {
        file_ref: upload.file_id().to_string(),
        kind: upload.kind,
        name: clean_name(file_name),
        caption: upload.caption.map(str::to_string),
    };

    let stored = database.insert_media(&media, now).await?;
    log::info!("Stored {:?} as {}", stored.name, stored.short_id);
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use teloxide::types::{FileId, FileMeta, FileUniqueId};

    use super::*;
    use crate::testing::temp_db;

    fn file_meta() -> FileMeta {
        FileMeta {
            id: FileId(String::from("BAACAgIAAxkBAAIB")),
            unique_id: FileUniqueId(String::from("AgADBAAD")),
            size: 1024,
        }
    }

    #[test]
    fn cleans_names() {
        assert_eq!(clean_name("My_Movie.2023.mkv"), "My Movie 2023 mkv");
        assert_eq!(clean_name("plain"), "plain");
        assert_eq!(clean_name("__.."), "    ");
    }

    #[tokio::test]
    async fn stores_video() {
        let (_dir, db) = temp_db().await;
        let meta = file_meta();
        let upload = UploadedFile {
            kind: FileKind::Video,
            file: &meta,
            file_name: Some("My_Movie.2023.mkv"),
            caption: Some("1080p"),
        };

        let stored = store_upload(&db, &upload, Utc::now()).await.unwrap();

        assert_eq!(stored.name, "My Movie 2023 mkv");
        assert_eq!(stored.views, 0);
        assert_eq!(stored.kind, FileKind::Video);
        assert_eq!(stored.file_ref, "BAACAgIAAxkBAAIB");
        assert_eq!(stored.caption.as_deref(), Some("1080p"));
        assert_eq!(stored.short_id.as_str().len(), 8);
        assert!(stored.short_id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));

        let found = db.find_media(stored.short_id.as_str()).await.unwrap().unwrap();
        assert_eq!(found, stored);
    }

    #[tokio::test]
    async fn nameless_video() {
        let (_dir, db) = temp_db().await;
        let meta = file_meta();
        let upload = UploadedFile {
            kind: FileKind::Video,
            file: &meta,
            file_name: None,
            caption: None,
        };

        let stored = store_upload(&db, &upload, Utc::now()).await.unwrap();
        assert_eq!(stored.name, "Unknown Video");
        assert_eq!(stored.caption, None);
    }

    #[tokio::test]
    async fn every_upload_gets_its_own_id() {
        let (_dir, db) = temp_db().await;
        let meta = file_meta();
        let upload = UploadedFile {
            kind: FileKind::Document,
            file: &meta,
            file_name: Some("same.pdf"),
            caption: None,
        };

        let first = store_upload(&db, &upload, Utc::now()).await.unwrap();
        let second = store_upload(&db, &upload, Utc::now()).await.unwrap();
        assert_ne!(first.short_id, second.short_id);
        assert_eq!(db.count_media().await.unwrap(), 2);
    }
}
