//! Catalog writer and catalog reads.
//!
//! Adding a phone stores its image first (named after the model) and then inserts the
//! catalog row, optionally together with its spec sheet. If the insert fails the image
//! is removed again so no orphan files pile up in the asset directory.

use crate::domain::duplicates::DuplicateMatch;
use crate::domain::model::{
    CatalogItem, DeviceSuggestion, NewPhone, PhoneDetail, SpecSheet, MAX_SUGGESTION_LEN,
};
use crate::domain::session::{Role, SessionContext};
use crate::error::{CoreError, CoreResult};
use crate::infra::image_store::ImageStore;
use crate::storage::{CatalogStore, Page};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Published reviews shown on a phone page.
pub const DETAIL_REVIEW_LIMIT: u32 = 20;

/// An uploaded image as received from the admin form.
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    /// Original client-side file name; only its extension is kept.
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    images: Arc<dyn ImageStore>,
    duplicate_match: DuplicateMatch,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        images: Arc<dyn ImageStore>,
        duplicate_match: DuplicateMatch,
    ) -> Self {
        Self {
            store,
            images,
            duplicate_match,
        }
    }

    /// Lowest catalog identifier whose model name matches `model_name`. Advisory only.
    pub async fn find_duplicate(&self, model_name: &str) -> CoreResult<Option<i64>> {
        if model_name.trim().is_empty() {
            return Ok(None);
        }
        self.store
            .find_phone_by_model(model_name, self.duplicate_match)
            .await
    }

    pub async fn create_phone(
        &self,
        ctx: &SessionContext,
        fields: &NewPhone,
        image: Option<ImageUpload>,
    ) -> CoreResult<CatalogItem> {
        self.insert(ctx, fields, image, None).await
    }

    pub async fn create_phone_with_specs(
        &self,
        ctx: &SessionContext,
        fields: &NewPhone,
        image: Option<ImageUpload>,
        specs: SpecSheet,
    ) -> CoreResult<CatalogItem> {
        // A sheet with every value blank is treated as no sheet at all.
        let specs = Some(specs.normalized()).filter(|s| !s.is_empty());
        self.insert(ctx, fields, image, specs).await
    }

    /// Second step of the two-step admin flow: attach (or replace) a spec sheet.
    pub async fn attach_specs(
        &self,
        ctx: &SessionContext,
        phone_id: i64,
        specs: SpecSheet,
    ) -> CoreResult<()> {
        ctx.require(Role::Admin)?;
        self.store
            .upsert_spec_sheet(phone_id, &specs.normalized())
            .await?;
        info!(phone_id, "spec sheet attached");
        Ok(())
    }

    async fn insert(
        &self,
        ctx: &SessionContext,
        fields: &NewPhone,
        image: Option<ImageUpload>,
        specs: Option<SpecSheet>,
    ) -> CoreResult<CatalogItem> {
        ctx.require(Role::Admin)?;

        let fields = fields.normalized();
        if fields.model_name.is_empty() {
            return Err(CoreError::validation("model name is required"));
        }
        if fields.brand.is_empty() {
            return Err(CoreError::validation("brand is required"));
        }
        let image = match image {
            Some(img) if !img.bytes.is_empty() => img,
            _ => return Err(CoreError::validation("an image upload is required")),
        };

        let file_name = image_file_name(&fields.model_name, image.file_name.as_deref());
        let stored = self.images.save(&file_name, &image.bytes).await?;

        match self.store.insert_phone(&fields, &stored, specs.as_ref()).await {
            Ok(item) => {
                info!(phone_id = item.id, model = %item.model_name, "phone added");
                Ok(item)
            }
            Err(e) => {
                warn!(error = %e, image = %stored, "phone insert failed, removing image");
                self.images.remove(&stored).await;
                Err(e)
            }
        }
    }

    pub async fn list_phones(&self, page: Page) -> CoreResult<Vec<CatalogItem>> {
        self.store.list_phones(page).await
    }

    pub async fn list_brands(&self) -> CoreResult<Vec<String>> {
        self.store.list_brands().await
    }

    pub async fn phones_by_brand(&self, brand: &str, page: Page) -> CoreResult<Vec<CatalogItem>> {
        self.store.list_phones_by_brand(brand.trim(), page).await
    }

    /// Empty queries return nothing rather than the whole catalog.
    pub async fn search_phones(&self, query: &str, limit: u32) -> CoreResult<Vec<CatalogItem>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.store.search_phones(query, limit).await
    }

    pub async fn phone_detail(&self, id: i64) -> CoreResult<PhoneDetail> {
        let phone = self
            .store
            .get_phone(id)
            .await?
            .ok_or_else(|| CoreError::not_found("phone", id))?;
        let specs = self.store.get_spec_sheet(id).await?;
        let reviews = self
            .store
            .published_reviews_for(id, DETAIL_REVIEW_LIMIT)
            .await?;
        Ok(PhoneDetail {
            phone,
            specs,
            reviews,
        })
    }

    pub async fn suggest_device(&self, model_name: &str) -> CoreResult<DeviceSuggestion> {
        let name = model_name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("device name is required"));
        }
        if name.chars().count() > MAX_SUGGESTION_LEN {
            return Err(CoreError::validation(format!(
                "device name must be at most {} characters",
                MAX_SUGGESTION_LEN
            )));
        }
        self.store.insert_suggestion(name, Utc::now()).await
    }

    pub async fn list_suggestions(
        &self,
        ctx: &SessionContext,
        limit: u32,
    ) -> CoreResult<Vec<DeviceSuggestion>> {
        ctx.require(Role::Admin)?;
        self.store.list_suggestions(limit).await
    }
}

/// Lower-case ASCII alphanumerics; every other run becomes one `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "phone".to_string()
    } else {
        slug
    }
}

/// `<slug>-slm<ext>`, extension lower-cased and taken from the uploaded file name.
pub fn image_file_name(model_name: &str, upload_name: Option<&str>) -> String {
    let ext = upload_name
        .and_then(|n| std::path::Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("{}-slm{}", slugify(model_name), ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::DiskImageStore;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingImages {
        saved: Mutex<Vec<String>>,
        removed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageStore for RecordingImages {
        async fn save(&self, file_name: &str, _bytes: &[u8]) -> CoreResult<String> {
            self.saved.lock().unwrap().push(file_name.to_string());
            Ok(file_name.to_string())
        }

        async fn remove(&self, file_name: &str) {
            self.removed.lock().unwrap().push(file_name.to_string());
        }
    }

    fn admin() -> SessionContext {
        SessionContext::with_roles(vec![Role::Admin], Utc::now() + Duration::hours(1))
    }

    fn fields(name: &str) -> NewPhone {
        NewPhone {
            model_name: name.into(),
            brand: "Samsung".into(),
            release_date: Some("2021, January 29".into()),
        }
    }

    fn upload(name: &str) -> Option<ImageUpload> {
        Some(ImageUpload {
            file_name: Some(name.into()),
            bytes: vec![0xff, 0xd8, 0xff],
        })
    }

    fn service() -> (CatalogService, Arc<MemoryStore>, Arc<RecordingImages>) {
        let store = Arc::new(MemoryStore::new());
        let images = Arc::new(RecordingImages::default());
        let svc = CatalogService::new(store.clone(), images.clone(), DuplicateMatch::Exact);
        (svc, store, images)
    }

    #[test]
    fn slugs_and_image_names() {
        assert_eq!(slugify("Galaxy S21 5G"), "galaxy-s21-5g");
        assert_eq!(slugify("  iPhone 13 (Pro) Max!"), "iphone-13-pro-max");
        assert_eq!(slugify("???"), "phone");
        assert_eq!(image_file_name("Galaxy S21", Some("shot.JPG")), "galaxy-s21-slm.jpg");
        assert_eq!(image_file_name("Galaxy S21", Some("shot")), "galaxy-s21-slm");
        assert_eq!(image_file_name("Galaxy S21", None), "galaxy-s21-slm");
    }

    #[tokio::test]
    async fn missing_image_fails_before_anything_is_stored() {
        let (svc, store, images) = service();
        let err = svc.create_phone(&admin(), &fields("Galaxy S21"), None).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let empty = Some(ImageUpload {
            file_name: Some("a.png".into()),
            bytes: Vec::new(),
        });
        let err = svc.create_phone(&admin(), &fields("Galaxy S21"), empty).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        assert!(images.saved.lock().unwrap().is_empty());
        assert!(store.list_phones(Page::new(10, 0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_stores_slugged_image_and_specs() {
        let (svc, store, images) = service();
        let specs = SpecSheet {
            weight: Some(" 169 g ".into()),
            ..Default::default()
        };
        let item = svc
            .create_phone_with_specs(&admin(), &fields("Galaxy S21"), upload("x.PNG"), specs)
            .await
            .unwrap();

        assert_eq!(item.image, "galaxy-s21-slm.png");
        assert_eq!(images.saved.lock().unwrap().as_slice(), ["galaxy-s21-slm.png"]);
        let stored = store.get_spec_sheet(item.id).await.unwrap().unwrap();
        assert_eq!(stored.weight.as_deref(), Some("169 g"));
    }

    #[tokio::test]
    async fn blank_spec_sheet_is_not_stored() {
        let (svc, store, _) = service();
        let blank = SpecSheet {
            os: Some("   ".into()),
            ..Default::default()
        };
        let item = svc
            .create_phone_with_specs(&admin(), &fields("Pixel 7"), upload("p.jpg"), blank)
            .await
            .unwrap();
        assert_eq!(store.get_spec_sheet(item.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn writer_requires_admin_and_fields() {
        let (svc, _, _) = service();
        let err = svc
            .create_phone(&SessionContext::anonymous(), &fields("Galaxy S21"), upload("a.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Authorization(_)));

        let err = svc
            .create_phone(&admin(), &fields("   "), upload("a.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn attach_specs_to_unknown_phone_is_not_found() {
        let (svc, _, _) = service();
        let err = svc
            .attach_specs(&admin(), 99, SpecSheet::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn duplicates_are_exact_by_default() {
        let (svc, _, _) = service();
        let item = svc
            .create_phone(&admin(), &fields("Galaxy S21"), upload("a.jpg"))
            .await
            .unwrap();
        assert_eq!(svc.find_duplicate("Galaxy S21").await.unwrap(), Some(item.id));
        assert_eq!(svc.find_duplicate("galaxy s21").await.unwrap(), None);
        assert_eq!(svc.find_duplicate("").await.unwrap(), None);
    }

    #[tokio::test]
    async fn suggestions_are_bounded_and_admin_listed() {
        let (svc, _, _) = service();
        assert!(matches!(
            svc.suggest_device("  ").await.unwrap_err(),
            CoreError::Validation(_)
        ));
        assert!(matches!(
            svc.suggest_device(&"x".repeat(MAX_SUGGESTION_LEN + 1)).await.unwrap_err(),
            CoreError::Validation(_)
        ));
        svc.suggest_device(" Nothing Phone 2 ").await.unwrap();

        assert!(svc.list_suggestions(&SessionContext::anonymous(), 10).await.is_err());
        let listed = svc.list_suggestions(&admin(), 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].model_name, "Nothing Phone 2");
    }

    #[tokio::test]
    async fn same_model_twice_keeps_first_image() {
        let dir = std::env::temp_dir().join(format!(
            "slmobi-catalog-{}-{}",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let store = Arc::new(MemoryStore::new());
        let svc = CatalogService::new(
            store.clone(),
            Arc::new(DiskImageStore::new(dir.clone())),
            DuplicateMatch::Exact,
        );
        let with_bytes = |bytes: &[u8]| {
            Some(ImageUpload {
                file_name: Some("shot.jpg".into()),
                bytes: bytes.to_vec(),
            })
        };

        let first = svc
            .create_phone(&admin(), &fields("Galaxy S21"), with_bytes(b"FIRST"))
            .await
            .unwrap();
        let err = svc
            .create_phone(&admin(), &fields("Galaxy S21"), with_bytes(b"SECOND"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let bytes = tokio::fs::read(dir.join(&first.image)).await.unwrap();
        assert_eq!(bytes, b"FIRST");
        assert_eq!(store.list_phones(Page::new(10, 0)).await.unwrap().len(), 1);
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn detail_of_unknown_phone_is_not_found() {
        let (svc, _, _) = service();
        assert!(matches!(
            svc.phone_detail(5).await.unwrap_err(),
            CoreError::NotFound { .. }
        ));
    }
}
