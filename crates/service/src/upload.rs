use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use domain::FileRef;
use storage::{Db, NewFile};
use tracing::warn;

use crate::error::{Result, ReviewsError};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 客户端上传的原始文件
#[derive(Debug, Clone, Default)]
pub struct RawUpload {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// 规范化后、可交给 `FileStore` 的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PreparedFile {
    /// 空上传槽（无文件名且无内容）返回 `None`
    pub fn from_raw(raw: RawUpload) -> Option<Self> {
        if raw.name.trim().is_empty() && raw.bytes.is_empty() {
            return None;
        }
        let content_type = raw
            .content_type
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        Some(Self {
            original_name: safe_basename(&raw.name),
            content_type,
            bytes: raw.bytes,
        })
    }

    fn extension(&self) -> Option<&str> {
        Path::new(&self.original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
    }
}

fn safe_basename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim().trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn save(&self, file: &PreparedFile, namespace: &str) -> Result<FileRef>;
    async fn delete(&self, file: &FileRef) -> Result<()>;
}

/// 文件内容存在根目录下，元数据存在内容库
pub struct LocalFileStore {
    db: Db,
    root: PathBuf,
    public_prefix: String,
}

impl LocalFileStore {
    pub fn new(db: Db, root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            db,
            root: root.into(),
            public_prefix: public_prefix.into(),
        }
    }

    fn src(&self, subdir: &str, file_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_prefix.trim_end_matches('/'),
            subdir,
            file_name
        )
    }
}

fn io_err(context: &str, e: impl std::fmt::Display) -> ReviewsError {
    ReviewsError::Io(format!("{}: {}", context, e))
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, file: &PreparedFile, namespace: &str) -> Result<FileRef> {
        let subdir = format!("{}/{:03x}", namespace, rand::random::<u16>() & 0xfff);
        let file_name = match file.extension() {
            Some(ext) => format!("{:016x}.{}", rand::random::<u64>(), ext.to_lowercase()),
            None => format!("{:016x}", rand::random::<u64>()),
        };

        let dir = self.root.join(&subdir);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_err("create upload dir", e))?;
        let path = dir.join(&file_name);
        tokio::fs::write(&path, &file.bytes)
            .await
            .map_err(|e| io_err("write upload", e))?;

        let record = NewFile {
            subdir: subdir.clone(),
            file_name: file_name.clone(),
            original_name: file.original_name.clone(),
            content_type: file.content_type.clone(),
            size: file.bytes.len() as i64,
        };
        let stored = match self.db.insert_file(&record).await {
            Ok(s) => s,
            Err(e) => {
                let _ = tokio::fs::remove_file(&path).await;
                return Err(io_err("record upload", e));
            }
        };

        Ok(FileRef {
            id: stored.id,
            src: self.src(&stored.subdir, &stored.file_name),
            content_type: stored.content_type,
        })
    }

    async fn delete(&self, file: &FileRef) -> Result<()> {
        let removed = self
            .db
            .delete_file(file.id)
            .await
            .map_err(|e| io_err("delete upload record", e))?;
        if let Some(stored) = removed {
            let path = self.root.join(stored.relative_path());
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(io_err("remove upload", e));
                }
            }
        }
        Ok(())
    }
}

/// 批量持久化上传文件，要么全部成功要么全部回滚
#[derive(Clone)]
pub struct FileUploader {
    store: Arc<dyn FileStore>,
    namespace: String,
}

impl FileUploader {
    pub fn new(store: Arc<dyn FileStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// 按输入顺序返回引用。任一文件失败时，
    /// 删除本批已保存的文件并返回错误。
    pub async fn upload(&self, files: Vec<RawUpload>) -> Result<Vec<FileRef>> {
        let prepared: Vec<PreparedFile> = files.into_iter().filter_map(PreparedFile::from_raw).collect();
        let mut saved = Vec::with_capacity(prepared.len());

        for file in &prepared {
            match self.store.save(file, &self.namespace).await {
                Ok(r) => saved.push(r),
                Err(e) => {
                    warn!(
                        file = %file.original_name,
                        saved = saved.len(),
                        "upload failed, rolling back batch: {}",
                        e
                    );
                    self.discard(&saved).await;
                    return Err(match e {
                        ReviewsError::Io(msg) => ReviewsError::Io(msg),
                        other => ReviewsError::Io(other.to_string()),
                    });
                }
            }
        }
        Ok(saved)
    }

    /// 尽力删除不会再被引用的文件
    pub async fn discard(&self, files: &[FileRef]) {
        for f in files {
            if let Err(e) = self.store.delete(f).await {
                warn!(file_id = f.id, "failed to remove orphaned upload: {}", e);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_support::memory_db;
    use std::sync::Mutex;

    /// 内存实现，遇到指定文件名时失败
    #[derive(Default)]
    pub struct FakeStore {
        pub fail_on: Option<String>,
        pub saved: Mutex<Vec<FileRef>>,
        pub deleted: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl FileStore for FakeStore {
        async fn save(&self, file: &PreparedFile, namespace: &str) -> Result<FileRef> {
            if self.fail_on.as_deref() == Some(file.original_name.as_str()) {
                return Err(ReviewsError::Io("disk full".into()));
            }
            let mut saved = self.saved.lock().unwrap();
            let r = FileRef {
                id: saved.len() as i64 + 1,
                src: format!("/upload/{}/{}", namespace, file.original_name),
                content_type: file.content_type.clone(),
            };
            saved.push(r.clone());
            Ok(r)
        }

        async fn delete(&self, file: &FileRef) -> Result<()> {
            self.deleted.lock().unwrap().push(file.id);
            Ok(())
        }
    }

    pub fn raw(name: &str) -> RawUpload {
        RawUpload {
            name: name.to_string(),
            content_type: Some("image/png".into()),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn prepares_descriptors() {
        assert!(PreparedFile::from_raw(RawUpload::default()).is_none());

        let p = PreparedFile::from_raw(RawUpload {
            name: "C:\\photos\\..\\cat.JPG".into(),
            content_type: None,
            bytes: vec![0],
        })
        .unwrap();
        assert_eq!(p.original_name, "cat.JPG");
        assert_eq!(p.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(p.extension(), Some("JPG"));

        let hidden = PreparedFile::from_raw(raw("../../.htaccess")).unwrap();
        assert_eq!(hidden.original_name, "htaccess");
    }

    #[tokio::test]
    async fn keeps_input_order_and_skips_empty_slots() {
        let store = Arc::new(FakeStore::default());
        let uploader = FileUploader::new(store.clone(), "reviews");
        let refs = uploader
            .upload(vec![raw("a.png"), RawUpload::default(), raw("b.png")])
            .await
            .unwrap();
        let srcs: Vec<&str> = refs.iter().map(|r| r.src.as_str()).collect();
        assert_eq!(srcs, vec!["/upload/reviews/a.png", "/upload/reviews/b.png"]);
    }

    #[tokio::test]
    async fn partial_failure_rolls_back_the_batch() {
        let store = Arc::new(FakeStore {
            fail_on: Some("c.png".into()),
            ..Default::default()
        });
        let uploader = FileUploader::new(store.clone(), "reviews");
        let err = uploader
            .upload(vec![raw("a.png"), raw("b.png"), raw("c.png")])
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewsError::Io(_)));
        assert_eq!(*store.deleted.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn local_store_writes_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let db = memory_db().await;
        let store = LocalFileStore::new(db.clone(), dir.path(), "/upload");

        let file = PreparedFile::from_raw(raw("photo.png")).unwrap();
        let r = store.save(&file, "reviews").await.unwrap();
        assert!(r.src.starts_with("/upload/reviews/"));
        assert!(r.src.ends_with(".png"));
        assert_eq!(r.content_type, "image/png");

        let on_disk = dir.path().join(r.src.trim_start_matches("/upload/"));
        assert_eq!(std::fs::read(&on_disk).unwrap(), vec![1, 2, 3]);

        store.delete(&r).await.unwrap();
        assert!(!on_disk.exists());
        // 重复删除不算错误
        store.delete(&r).await.unwrap();
    }
}
