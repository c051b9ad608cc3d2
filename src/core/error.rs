//! Error handling for publish profile management
//!
//! This module provides typed errors with recovery guidance using the
//! thiserror crate for ergonomic error handling.

use thiserror::Error;

/// Main error type for publish profile operations
#[derive(Error, Debug)]
pub enum ProfileError {
    // Validation errors
    #[error("[{name}] 同じ名前の公開プロファイルが既に存在します")]
    DuplicateName { name: String },

    #[error("プロファイルのインデックスが範囲外です（{index} / {len}件）")]
    IndexOutOfRange { index: usize, len: usize },

    // Selection errors
    #[error("公開先のプロファイルが選択されていません")]
    NoTargetSelected,

    // Dispatch errors
    #[error("[{target}] 別の操作が実行中です。完了を待ってから再試行してください")]
    OperationInFlight { target: String },

    #[error("[{target}] このプロファイルはロールバックをサポートしていません")]
    RollbackNotSupported { target: String },

    // Remote call errors
    #[error("[{service}] リモート呼び出しに失敗しました: {message}")]
    RemoteCall { service: String, message: String },

    // Settings document errors
    #[error("設定ドキュメントの処理に失敗しました: {message}")]
    Settings { message: String },
}

impl ProfileError {
    /// Build a remote-call error from any service failure
    pub fn remote(service: &str, error: impl std::fmt::Display) -> Self {
        Self::RemoteCall {
            service: service.to_string(),
            message: error.to_string(),
        }
    }

    /// Get the target name associated with this error, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::DuplicateName { name } => Some(name),
            Self::OperationInFlight { target } | Self::RollbackNotSupported { target } => {
                Some(target)
            }
            _ => None,
        }
    }

    /// Check if this error is recoverable by retrying the interaction
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::RollbackNotSupported { .. })
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateName { .. } => "DUPLICATE_NAME",
            Self::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            Self::NoTargetSelected => "NO_TARGET_SELECTED",
            Self::OperationInFlight { .. } => "OPERATION_IN_FLIGHT",
            Self::RollbackNotSupported { .. } => "ROLLBACK_NOT_SUPPORTED",
            Self::RemoteCall { .. } => "REMOTE_CALL_FAILURE",
            Self::Settings { .. } => "SETTINGS_ERROR",
        }
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::DuplicateName { .. } => vec![
                "別のプロファイル名を指定してください",
                "既存のプロファイルを編集する場合はeditを使用してください",
            ],
            Self::IndexOutOfRange { .. } => vec![
                "プロファイル一覧を再取得してください",
                "他の編集によりインデックスが変わった可能性があります",
            ],
            Self::NoTargetSelected => {
                vec!["公開先のプロファイルを選択してください（\"all\"は選択できません）"]
            }
            Self::OperationInFlight { .. } => {
                vec!["実行中の公開またはロールバックの完了を待ってください"]
            }
            Self::RollbackNotSupported { .. } => vec![
                "公開タイプのrollback機能が有効か確認してください",
                "ロールバック対象はステータス200のバージョンのみです",
            ],
            Self::RemoteCall { .. } => vec![
                "ネットワーク接続を確認してください",
                "サービスのステータスを確認してから再試行してください",
            ],
            Self::Settings { .. } => vec!["設定ドキュメントの内容を確認してください"],
        }
    }
}
