//! JSON package import.
//!
//! A document carries one package with its blocks, and every block carries its
//! questions inline:
//!
//! ```json
//! {
//!   "id": 2,
//!   "title": "Tryout SNBT #2",
//!   "blocks": [
//!     {
//!       "id": 21,
//!       "name": "Penalaran Umum",
//!       "duration_minutes": 30,
//!       "questions": [
//!         {
//!           "id": 2001,
//!           "text": "2, 4, 8, 16, ...",
//!           "options": [{ "label": "A", "text": "24" }, { "label": "B", "text": "32" }],
//!           "correct": "B",
//!           "explanation": "Each term doubles."
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Option ids are assigned from their position (1-based) unless given.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use storage::repository::{PackageRepository, QuestionRepository};
use tryout_core::model::{
    AnswerOption, Block, BlockId, OptionId, PackageId, Question, QuestionId, TryoutPackage,
};

use crate::error::ImportError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageDocument {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<BlockDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockDocument {
    pub id: u64,
    pub name: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub questions: Vec<QuestionDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuestionDocument {
    pub id: u64,
    pub text: String,
    pub options: Vec<OptionDocument>,
    /// Label of the correct option, e.g. `"B"`.
    pub correct: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionDocument {
    #[serde(default)]
    pub id: Option<u64>,
    pub label: String,
    pub text: String,
}

impl QuestionDocument {
    fn into_question(self) -> Result<Question, ImportError> {
        let question_id = QuestionId::new(self.id);
        let options: Vec<AnswerOption> = (1_u64..)
            .zip(self.options)
            .map(|(position, o)| {
                AnswerOption::new(OptionId::new(o.id.unwrap_or(position)), o.label, o.text)
            })
            .collect();
        let correct = options
            .iter()
            .find(|o| o.label.trim().eq_ignore_ascii_case(self.correct.trim()))
            .map(|o| o.id)
            .ok_or_else(|| ImportError::UnknownCorrectLabel {
                question_id,
                label: self.correct.clone(),
            })?;
        Ok(Question::new(
            question_id,
            self.text,
            options,
            correct,
            self.explanation,
        )?)
    }
}

impl PackageDocument {
    /// Parse a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Json` for malformed or unexpected fields.
    pub fn from_json(raw: &str) -> Result<Self, ImportError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Validate into domain types through the core constructors.
    ///
    /// # Errors
    ///
    /// Returns `ImportError` when the package or one of its questions is
    /// invalid.
    pub fn into_domain(self) -> Result<(TryoutPackage, Vec<Question>), ImportError> {
        let mut blocks = Vec::with_capacity(self.blocks.len());
        let mut questions = Vec::new();
        for block in self.blocks {
            let mut ids = Vec::with_capacity(block.questions.len());
            for doc in block.questions {
                let question = doc.into_question()?;
                ids.push(question.id());
                questions.push(question);
            }
            blocks.push(Block::new(
                BlockId::new(block.id),
                block.name,
                ids,
                block.duration_minutes,
            )?);
        }
        let package = TryoutPackage::new(PackageId::new(self.id), self.title, blocks)?;
        Ok((package, questions))
    }
}

/// Summary of a completed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub package_id: PackageId,
    pub blocks: usize,
    pub questions: usize,
}

/// Writes JSON package documents into the question bank and package store.
#[derive(Clone)]
pub struct PackageImportService {
    packages: Arc<dyn PackageRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl PackageImportService {
    #[must_use]
    pub fn new(
        packages: Arc<dyn PackageRepository>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            packages,
            questions,
        }
    }

    /// Import a document from JSON text, replacing a package with the same id.
    ///
    /// The whole document is validated before anything is written. Writes are
    /// not atomic across the document: questions go in one upsert each, then
    /// the package, so a storage failure part way can leave questions without
    /// their package. Every write is an upsert, so importing the same document
    /// again completes it.
    ///
    /// # Errors
    ///
    /// Returns `ImportError` for parse, validation or storage failures.
    pub async fn import_json(&self, raw: &str) -> Result<ImportReport, ImportError> {
        let (package, questions) = PackageDocument::from_json(raw)?.into_domain()?;

        for question in &questions {
            self.questions.upsert_question(question).await?;
        }
        self.packages.upsert_package(&package).await?;

        let report = ImportReport {
            package_id: package.id(),
            blocks: package.block_count(),
            questions: questions.len(),
        };
        log::info!(
            "imported package {} \"{}\" ({} blocks, {} questions)",
            report.package_id,
            package.title(),
            report.blocks,
            report.questions
        );
        Ok(report)
    }

    /// Read `path` and import it.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Io` if the file cannot be read, otherwise as
    /// [`Self::import_json`].
    pub async fn import_file(&self, path: &Path) -> Result<ImportReport, ImportError> {
        let raw = tokio::fs::read_to_string(path).await?;
        self.import_json(&raw).await
    }
}

#[cfg(test)]
mod tests {
    use storage::repository::{Storage, StorageError};
    use tryout_core::model::PackageError;

    use super::*;

    const DOC: &str = r#"
        {
            "id": 2,
            "title": "Tryout SNBT #2",
            "blocks": [
                {
                    "id": 21,
                    "name": "Penalaran Umum",
                    "duration_minutes": 30,
                    "questions": [
                        {
                            "id": 2001,
                            "text": "2, 4, 8, 16, ...",
                            "options": [
                                { "label": "A", "text": "24" },
                                { "label": "B", "text": "32" }
                            ],
                            "correct": "b",
                            "explanation": "Each term doubles."
                        }
                    ]
                },
                {
                    "id": 22,
                    "name": "Literasi",
                    "duration_minutes": 20,
                    "questions": [
                        {
                            "id": 2002,
                            "text": "Pick the odd one out.",
                            "options": [
                                { "id": 7, "label": "A", "text": "apel" },
                                { "id": 9, "label": "B", "text": "meja" }
                            ],
                            "correct": "B"
                        }
                    ]
                }
            ]
        }
    "#;

    fn service(storage: &Storage) -> PackageImportService {
        PackageImportService::new(Arc::clone(&storage.packages), Arc::clone(&storage.questions))
    }

    #[tokio::test]
    async fn imports_package_and_questions() {
        let storage = Storage::in_memory();
        let report = service(&storage).import_json(DOC).await.unwrap();
        assert_eq!(
            report,
            ImportReport {
                package_id: PackageId::new(2),
                blocks: 2,
                questions: 2,
            }
        );

        let package = storage
            .packages
            .get_package(PackageId::new(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(package.total_minutes(), 50);
        assert_eq!(package.blocks()[1].question_ids(), &[QuestionId::new(2002)]);

        let questions = storage
            .questions
            .get_questions(&[QuestionId::new(2001), QuestionId::new(2002)])
            .await
            .unwrap();
        assert_eq!(questions[0].correct_option(), OptionId::new(2));
        assert_eq!(questions[1].correct_option(), OptionId::new(9));
        assert_eq!(questions[1].explanation(), None);
    }

    #[test]
    fn rejects_unknown_correct_label() {
        let raw = DOC.replace("\"correct\": \"B\"", "\"correct\": \"E\"");
        let err = PackageDocument::from_json(&raw)
            .unwrap()
            .into_domain()
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::UnknownCorrectLabel { question_id, .. }
                if question_id == QuestionId::new(2002)
        ));
    }

    struct FailingOncePackages {
        inner: Arc<dyn PackageRepository>,
        failed: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl PackageRepository for FailingOncePackages {
        async fn upsert_package(&self, package: &TryoutPackage) -> Result<(), StorageError> {
            if !self.failed.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Err(StorageError::Connection("disk full".into()));
            }
            self.inner.upsert_package(package).await
        }

        async fn get_package(&self, id: PackageId) -> Result<Option<TryoutPackage>, StorageError> {
            self.inner.get_package(id).await
        }

        async fn list_packages(&self, limit: u32) -> Result<Vec<TryoutPackage>, StorageError> {
            self.inner.list_packages(limit).await
        }
    }

    #[tokio::test]
    async fn reimport_completes_after_storage_failure() {
        let storage = Storage::in_memory();
        let packages = Arc::new(FailingOncePackages {
            inner: Arc::clone(&storage.packages),
            failed: std::sync::atomic::AtomicBool::new(false),
        });
        let service = PackageImportService::new(packages, Arc::clone(&storage.questions));

        assert!(matches!(
            service.import_json(DOC).await,
            Err(ImportError::Storage(StorageError::Connection(_)))
        ));
        assert!(storage.packages.list_packages(10).await.unwrap().is_empty());
        assert_eq!(
            storage
                .questions
                .get_questions(&[QuestionId::new(2001), QuestionId::new(2002)])
                .await
                .unwrap()
                .len(),
            2
        );

        let report = service.import_json(DOC).await.unwrap();
        assert_eq!(report.questions, 2);
        let package = storage
            .packages
            .get_package(PackageId::new(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(package.block_count(), 2);
    }

    #[tokio::test]
    async fn invalid_documents_write_nothing() {
        let storage = Storage::in_memory();
        let raw = DOC.replace("\"id\": 2002", "\"id\": 2001");
        let err = service(&storage).import_json(&raw).await.unwrap_err();
        assert!(matches!(
            err,
            ImportError::Package(PackageError::DuplicateQuestion(_))
        ));
        assert!(storage.packages.list_packages(10).await.unwrap().is_empty());
        assert!(
            storage
                .questions
                .get_questions(&[QuestionId::new(2001)])
                .await
                .unwrap()
                .is_empty()
        );

        assert!(matches!(
            service(&storage).import_json("{\"id\": 1}").await,
            Err(ImportError::Json(_))
        ));
    }
}
