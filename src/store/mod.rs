pub mod connection;
#[cfg(test)]
pub(crate) mod memory;
pub mod quiz;

use connection::Document;
use quiz::{AppData, PlayerResult, Quiz};

use crate::error::StoreError;

/// Without a backend reads come back empty and writes do nothing.
pub struct Storage<D> {
    document: Option<D>,
}

impl<D: Document> Storage<D> {
    pub fn new(document: D) -> Self {
        Self {
            document: Some(document),
        }
    }

    pub fn unconfigured() -> Self {
        Self { document: None }
    }

    pub fn is_configured(&self) -> bool {
        self.document.is_some()
    }

    async fn load(&self) -> Result<AppData, StoreError> {
        match &self.document {
            Some(document) => document.fetch().await,
            None => Ok(AppData::default()),
        }
    }

    async fn save(&self, data: &AppData) -> Result<(), StoreError> {
        match &self.document {
            Some(document) => document.write(data).await,
            None => Ok(()),
        }
    }

    pub async fn quizzes(&self) -> Result<Vec<Quiz>, StoreError> {
        Ok(self.load().await?.quizzes)
    }

    pub async fn find_quiz(&self, id: &str) -> Result<Option<Quiz>, StoreError> {
        let quizzes = self.quizzes().await?;
        Ok(quizzes.into_iter().find(|quiz| quiz.id() == id))
    }

    pub async fn replace_quizzes(&self, quizzes: Vec<Quiz>) -> Result<(), StoreError> {
        if !self.is_configured() {
            return Ok(());
        }
        let mut data = self.load().await?;
        log::debug!(
            "Replacing {} quizzes with {}",
            data.quizzes.len(),
            quizzes.len()
        );
        data.quizzes = quizzes;
        self.save(&data).await
    }

    // Unknown ids write nothing.
    pub async fn delete_quiz(&self, id: &str) -> Result<Vec<Quiz>, StoreError> {
        let mut data = self.load().await?;
        let before = data.quizzes.len();
        data.quizzes.retain(|quiz| quiz.id() != id);
        let had_podium = data.podiums.remove(id).is_some();

        if data.quizzes.len() == before && !had_podium {
            log::info!("Quiz {} doesn't exist, nothing to delete.", id);
            return Ok(data.quizzes);
        }

        self.save(&data).await?;
        Ok(data.quizzes)
    }

    pub async fn append_result(&self, quiz_id: &str, result: PlayerResult) -> Result<(), StoreError> {
        if !self.is_configured() {
            return Ok(());
        }
        let mut data = self.load().await?;
        data.podiums
            .entry(quiz_id.to_owned())
            .or_default()
            .push(result);
        self.save(&data).await
    }

    pub async fn results(&self, quiz_id: &str) -> Result<Vec<PlayerResult>, StoreError> {
        let mut data = self.load().await?;
        Ok(data.podiums.remove(quiz_id).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{memory::MemoryDocument, quiz::Question};

    fn quiz(id: &str) -> Quiz {
        Quiz::retreive(
            id.into(),
            format!("Quiz {id}"),
            vec![Question::new("Q".into(), vec!["a".into(), "b".into()], 0)],
        )
    }

    #[tokio::test]
    async fn unconfigured_storage_is_inert() {
        let storage = Storage::<MemoryDocument>::unconfigured();

        storage.replace_quizzes(vec![quiz("1")]).await.unwrap();
        storage
            .append_result("1", PlayerResult::new("Ann".into(), 1))
            .await
            .unwrap();

        assert!(!storage.is_configured());
        assert!(storage.quizzes().await.unwrap().is_empty());
        assert!(storage.results("1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replacing_quizzes_keeps_podiums() {
        let storage = Storage::new(MemoryDocument::default());
        storage
            .append_result("1", PlayerResult::new("Ann".into(), 1))
            .await
            .unwrap();

        storage.replace_quizzes(vec![quiz("1"), quiz("2")]).await.unwrap();

        assert_eq!(storage.quizzes().await.unwrap().len(), 2);
        assert_eq!(storage.results("1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn results_are_appended_in_order() {
        let storage = Storage::new(MemoryDocument::default());
        for (name, score) in [("Ann", 1), ("Bob", 2)] {
            storage
                .append_result("7", PlayerResult::new(name.into(), score))
                .await
                .unwrap();
        }

        let names: Vec<String> = storage
            .results("7")
            .await
            .unwrap()
            .iter()
            .map(|r| r.name().to_owned())
            .collect();
        assert_eq!(names, ["Ann", "Bob"]);
    }

    #[tokio::test]
    async fn delete_removes_quiz_and_podium() {
        let storage = Storage::new(MemoryDocument::default());
        storage.replace_quizzes(vec![quiz("1"), quiz("2")]).await.unwrap();
        storage
            .append_result("1", PlayerResult::new("Ann".into(), 1))
            .await
            .unwrap();

        let remaining = storage.delete_quiz("1").await.unwrap();

        assert_eq!(remaining, vec![quiz("2")]);
        assert!(storage.results("1").await.unwrap().is_empty());
        assert!(storage.find_quiz("1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_unknown_quiz_changes_nothing() {
        let document = MemoryDocument::default();
        let storage = Storage::new(document);
        storage.replace_quizzes(vec![quiz("1")]).await.unwrap();
        let writes = storage.document.as_ref().unwrap().writes();

        let remaining = storage.delete_quiz("missing").await.unwrap();

        assert_eq!(remaining, vec![quiz("1")]);
        assert_eq!(storage.document.as_ref().unwrap().writes(), writes);
    }

    #[tokio::test]
    async fn failed_fetch_is_reported() {
        let storage = Storage::new(MemoryDocument::failing());

        assert!(storage.quizzes().await.is_err());
        assert!(storage
            .append_result("1", PlayerResult::new("Ann".into(), 0))
            .await
            .is_err());
    }
}
