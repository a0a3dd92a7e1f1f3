//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum shared by the credential store, the access
//! gate and the dispatch loop.

/// エラー種別の列挙体
///
/// ログインサーバー全体で共有する失敗の分類です。
/// ディスパッチループは [`ErrorKind::is_recoverable`] を見て、
/// 次の tick に進むか、プロセスを停止するかを決めます。
///
/// ## Notes
/// * `non_exhaustive` - 将来的に列挙子が追加される可能性があることを示す
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::CorruptRecord;
/// assert!(!kind.is_recoverable());
/// assert_eq!(kind.as_str(), "Corrupt Record");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 資格情報ファイルを必要なモードで開けない
    StoreOpen,
    /// レコードが固定長の形に満たないまま終わっている
    CorruptRecord,
    /// 呼び出し側が渡したソルトが 16 バイトではない
    InvalidSalt,
    /// ユーザー名などの入力が契約に違反している
    InvalidInput,
    /// ハッシュ計算そのものが失敗した
    Hashing,
    /// accept 中の回復可能なソケットエラー
    Socket,
    /// リスナーの bind/listen に失敗した（回復不能）
    Init,
    /// その他の I/O エラー
    Io,
}

impl ErrorKind {
    /// 表示用の文字列表現を取得
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::StoreOpen.as_str(), "Store Open");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::StoreOpen => "Store Open",
            ErrorKind::CorruptRecord => "Corrupt Record",
            ErrorKind::InvalidSalt => "Invalid Salt",
            ErrorKind::InvalidInput => "Invalid Input",
            ErrorKind::Hashing => "Hashing",
            ErrorKind::Socket => "Socket",
            ErrorKind::Init => "Init",
            ErrorKind::Io => "I/O",
        }
    }

    /// ループが次の tick に進めるエラーかどうか
    ///
    /// accept 中のソケットエラーだけが回復可能です。
    /// それ以外は呼び出し元の操作にとって致命的で、再試行はしません。
    #[inline]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, ErrorKind::Socket)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_socket_is_recoverable() {
        assert!(ErrorKind::Socket.is_recoverable());
        assert!(!ErrorKind::StoreOpen.is_recoverable());
        assert!(!ErrorKind::CorruptRecord.is_recoverable());
        assert!(!ErrorKind::InvalidSalt.is_recoverable());
        assert!(!ErrorKind::Init.is_recoverable());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::Io.to_string(), "I/O");
        assert_eq!(ErrorKind::InvalidSalt.to_string(), "Invalid Salt");
    }
}
