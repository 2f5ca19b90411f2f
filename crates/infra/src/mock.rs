//! # テスト用モック実装
//!
//! ユースケーステストで使用するインメモリのモックリポジトリと
//! モック外部クライアント。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! noticeflow-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use noticeflow_domain::{
    furnish::{
        AddressType,
        FurnishApplication,
        FurnishDocument,
        FurnishStatus,
        NoticeSuspension,
        OwnerDriver,
        OwnerDriverAddr,
        OwnerDriverIndicator,
        SuspensionType,
    },
    notice::Notice,
    notification::{EmailMessage, NotificationError},
    value_objects::{NoticeNo, TxnNo, Version},
};

use crate::{
    db::{TransactionManager, TxContext},
    error::InfraError,
    notification::NotificationSender,
    portal::EservicePortalClient,
    repository::{
        ExclusionListRepository,
        FurnishApplicationRepository,
        FurnishDocumentRepository,
        NoticeRepository,
        OwnerDriverRepository,
        SuspensionRepository,
    },
};

// ===== MockNoticeRepository =====

#[derive(Clone, Default)]
pub struct MockNoticeRepository {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl MockNoticeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_notice(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

#[async_trait]
impl NoticeRepository for MockNoticeRepository {
    async fn find_by_no(&self, notice_no: &NoticeNo) -> Result<Option<Notice>, InfraError> {
        Ok(self
            .notices
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.notice_no() == notice_no)
            .cloned())
    }
}

// ===== MockFurnishApplicationRepository =====

#[derive(Clone, Default)]
pub struct MockFurnishApplicationRepository {
    applications: Arc<Mutex<Vec<FurnishApplication>>>,
}

impl MockFurnishApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト準備用: 申請を直接投入する
    pub fn add_application(&self, application: FurnishApplication) {
        self.applications.lock().unwrap().push(application);
    }

    /// テスト検証用: 保持している全申請を返す
    pub fn applications(&self) -> Vec<FurnishApplication> {
        self.applications.lock().unwrap().clone()
    }
}

#[async_trait]
impl FurnishApplicationRepository for MockFurnishApplicationRepository {
    async fn insert(
        &self,
        application: &FurnishApplication,
        _tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        self.applications.lock().unwrap().push(application.clone());
        Ok(())
    }

    async fn update_with_version_check(
        &self,
        application: &FurnishApplication,
        expected_version: Version,
        _tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        let mut applications = self.applications.lock().unwrap();
        let Some(pos) = applications
            .iter()
            .position(|a| a.txn_no() == application.txn_no())
        else {
            return Err(InfraError::conflict(
                "FurnishApplication",
                application.txn_no().as_str(),
            ));
        };

        if applications[pos].version() != expected_version {
            return Err(InfraError::conflict(
                "FurnishApplication",
                application.txn_no().as_str(),
            ));
        }
        applications[pos] = application.clone();
        Ok(())
    }

    async fn find_by_txn_no(
        &self,
        txn_no: &TxnNo,
    ) -> Result<Option<FurnishApplication>, InfraError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.txn_no() == txn_no)
            .cloned())
    }

    async fn find_by_notice_no(
        &self,
        notice_no: &NoticeNo,
    ) -> Result<Vec<FurnishApplication>, InfraError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.notice_no() == notice_no)
            .cloned()
            .collect())
    }

    async fn exists_for_notice(&self, notice_no: &NoticeNo) -> Result<bool, InfraError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.notice_no() == notice_no))
    }

    async fn find_by_statuses(
        &self,
        statuses: &[FurnishStatus],
    ) -> Result<Vec<FurnishApplication>, InfraError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|a| statuses.contains(&a.status()))
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<FurnishApplication>, InfraError> {
        Ok(self.applications.lock().unwrap().clone())
    }
}

// ===== MockFurnishDocumentRepository =====

#[derive(Clone, Default)]
pub struct MockFurnishDocumentRepository {
    documents: Arc<Mutex<Vec<FurnishDocument>>>,
}

impl MockFurnishDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト検証用: 保持している全書類リンクを返す
    pub fn documents(&self) -> Vec<FurnishDocument> {
        self.documents.lock().unwrap().clone()
    }
}

#[async_trait]
impl FurnishDocumentRepository for MockFurnishDocumentRepository {
    async fn insert_all(
        &self,
        documents: &[FurnishDocument],
        _tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        self.documents
            .lock()
            .unwrap()
            .extend(documents.iter().cloned());
        Ok(())
    }

    async fn find_by_txn_no(&self, txn_no: &TxnNo) -> Result<Vec<FurnishDocument>, InfraError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| &d.txn_no == txn_no)
            .cloned()
            .collect())
    }
}

// ===== MockOwnerDriverRepository =====

#[derive(Clone, Default)]
pub struct MockOwnerDriverRepository {
    owner_drivers: Arc<Mutex<Vec<OwnerDriver>>>,
    addresses:     Arc<Mutex<Vec<OwnerDriverAddr>>>,
}

impl MockOwnerDriverRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト準備用: 名宛人を直接投入する
    pub fn add_owner_driver(&self, owner_driver: OwnerDriver) {
        self.owner_drivers.lock().unwrap().push(owner_driver);
    }

    /// テスト検証用: 保持している全名宛人を返す
    pub fn owner_drivers(&self) -> Vec<OwnerDriver> {
        self.owner_drivers.lock().unwrap().clone()
    }

    /// テスト検証用: 保持している全住所を返す
    pub fn addresses(&self) -> Vec<OwnerDriverAddr> {
        self.addresses.lock().unwrap().clone()
    }
}

#[async_trait]
impl OwnerDriverRepository for MockOwnerDriverRepository {
    async fn upsert(
        &self,
        owner_driver: &OwnerDriver,
        _tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        let mut owner_drivers = self.owner_drivers.lock().unwrap();
        if let Some(pos) = owner_drivers.iter().position(|od| {
            od.notice_no() == owner_driver.notice_no()
                && od.indicator() == owner_driver.indicator()
        }) {
            owner_drivers[pos] = owner_driver.clone();
        } else {
            owner_drivers.push(owner_driver.clone());
        }
        Ok(())
    }

    async fn upsert_address(
        &self,
        address: &OwnerDriverAddr,
        _tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        let mut addresses = self.addresses.lock().unwrap();
        if let Some(pos) = addresses.iter().position(|a| {
            a.notice_no == address.notice_no
                && a.indicator == address.indicator
                && a.address_type == address.address_type
        }) {
            addresses[pos] = address.clone();
        } else {
            addresses.push(address.clone());
        }
        Ok(())
    }

    async fn find_by_notice_no(
        &self,
        notice_no: &NoticeNo,
    ) -> Result<Vec<OwnerDriver>, InfraError> {
        Ok(self
            .owner_drivers
            .lock()
            .unwrap()
            .iter()
            .filter(|od| od.notice_no() == notice_no)
            .cloned()
            .collect())
    }

    async fn find_by_key(
        &self,
        notice_no: &NoticeNo,
        indicator: OwnerDriverIndicator,
    ) -> Result<Option<OwnerDriver>, InfraError> {
        Ok(self
            .owner_drivers
            .lock()
            .unwrap()
            .iter()
            .find(|od| od.notice_no() == notice_no && od.indicator() == indicator)
            .cloned())
    }

    async fn find_address(
        &self,
        notice_no: &NoticeNo,
        indicator: OwnerDriverIndicator,
        address_type: AddressType,
    ) -> Result<Option<OwnerDriverAddr>, InfraError> {
        Ok(self
            .addresses
            .lock()
            .unwrap()
            .iter()
            .find(|a| {
                a.notice_no == *notice_no
                    && a.indicator == indicator
                    && a.address_type == address_type
            })
            .cloned())
    }
}

// ===== MockSuspensionRepository =====

#[derive(Clone, Default)]
pub struct MockSuspensionRepository {
    suspensions: Arc<Mutex<Vec<NoticeSuspension>>>,
}

impl MockSuspensionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト準備用: サスペンションを直接投入する
    pub fn add_suspension(&self, suspension: NoticeSuspension) {
        self.suspensions.lock().unwrap().push(suspension);
    }

    /// テスト検証用: 保持している全サスペンションを返す
    pub fn suspensions(&self) -> Vec<NoticeSuspension> {
        self.suspensions.lock().unwrap().clone()
    }
}

#[async_trait]
impl SuspensionRepository for MockSuspensionRepository {
    async fn find_active(
        &self,
        notice_no: &NoticeNo,
        suspension_type: SuspensionType,
    ) -> Result<Option<NoticeSuspension>, InfraError> {
        Ok(self
            .suspensions
            .lock()
            .unwrap()
            .iter()
            .find(|s| {
                s.notice_no() == notice_no
                    && s.suspension_type() == suspension_type
                    && s.is_active()
            })
            .cloned())
    }

    async fn insert(
        &self,
        suspension: &NoticeSuspension,
        _tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        self.suspensions.lock().unwrap().push(suspension.clone());
        Ok(())
    }

    async fn update(
        &self,
        suspension: &NoticeSuspension,
        _tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        let mut suspensions = self.suspensions.lock().unwrap();
        let Some(pos) = suspensions.iter().position(|s| {
            s.notice_no() == suspension.notice_no()
                && s.suspension_type() == suspension.suspension_type()
                && s.start_at() == suspension.start_at()
        }) else {
            return Err(InfraError::conflict(
                "NoticeSuspension",
                suspension.notice_no().as_str(),
            ));
        };
        suspensions[pos] = suspension.clone();
        Ok(())
    }
}

// ===== MockExclusionListRepository =====

#[derive(Clone, Default)]
pub struct MockExclusionListRepository {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl MockExclusionListRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト準備用: ID を除外リストに追加する
    pub fn add_id(&self, id_no: impl Into<String>) {
        self.ids.lock().unwrap().insert(id_no.into());
    }
}

#[async_trait]
impl ExclusionListRepository for MockExclusionListRepository {
    async fn contains(&self, id_no: &str) -> Result<bool, InfraError> {
        Ok(self.ids.lock().unwrap().contains(id_no))
    }
}

// ===== MockTransactionManager =====

/// テスト用 TransactionManager
///
/// Mock リポジトリはインメモリ実装のため、実際のトランザクションは不要。
pub struct MockTransactionManager;

#[async_trait]
impl TransactionManager for MockTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        Ok(TxContext::mock())
    }
}

// ===== MockNotificationSender =====

/// テスト用メール送信
///
/// 送信されたメールを記録する。`failing()` で常に失敗するモードになる。
#[derive(Clone, Default)]
pub struct MockNotificationSender {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    fail: bool,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に送信失敗するモードで作成する
    pub fn failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    /// テスト検証用: 送信されたメール一覧を返す
    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::SendFailed(
                "モック送信失敗".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ===== MockEservicePortalClient =====

/// テスト用 eService ポータルクライアント
///
/// 呼び出された通知書番号を記録する。`failing()` で常に失敗するモードになる。
#[derive(Clone, Default)]
pub struct MockEservicePortalClient {
    calls: Arc<Mutex<Vec<String>>>,
    fail:  bool,
}

impl MockEservicePortalClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に呼び出し失敗するモードで作成する
    pub fn failing() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail:  true,
        }
    }

    /// テスト検証用: 呼び出された通知書番号一覧を返す
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EservicePortalClient for MockEservicePortalClient {
    async fn resend_notice_to_portal(&self, notice_no: &NoticeNo) -> Result<(), InfraError> {
        if self.fail {
            return Err(InfraError::portal("モックポータル失敗".to_string()));
        }
        self.calls.lock().unwrap().push(notice_no.to_string());
        Ok(())
    }
}
