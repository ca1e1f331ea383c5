//! 凭据存储 - 业务能力层
//!
//! 账号配置的唯一归宿。密码落盘前始终用数据目录里的对称密钥加密，
//! 这里也是全程唯一允许解密的地方；解出的明文只交给活动会话，
//! 绝不进日志。

use std::path::{Path, PathBuf};

use aes_gcm::aead::{rand_core::RngCore, Aead, OsRng};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::browser::RemoteEndpoint;
use crate::error::{AppError, StoreError};

/// 密钥文件名
const KEY_FILE: &str = "key.key";
/// 账号配置文件名
const CONFIG_FILE: &str = "config.json";
/// AES-GCM 随机数长度
const NONCE_LEN: usize = 12;

/// 账号配置
///
/// 内存里的 `password` 始终是明文；加密与解密只发生在落盘边界。
#[derive(Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_remote_host")]
    pub remote_host: String,
    #[serde(default = "default_remote_port")]
    pub remote_port: u16,
    #[serde(default = "default_remote_protocol")]
    pub remote_protocol: String,
    #[serde(default)]
    pub use_remote: bool,
}

fn default_remote_host() -> String {
    "localhost".to_string()
}

fn default_remote_port() -> u16 {
    3000
}

fn default_remote_protocol() -> String {
    "ws".to_string()
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            remote_host: default_remote_host(),
            remote_port: default_remote_port(),
            remote_protocol: default_remote_protocol(),
            use_remote: false,
        }
    }
}

// 手写 Debug：密码永远不进日志
impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("email", &self.email)
            .field("password", &"***")
            .field("remote_host", &self.remote_host)
            .field("remote_port", &self.remote_port)
            .field("remote_protocol", &self.remote_protocol)
            .field("use_remote", &self.use_remote)
            .finish()
    }
}

impl AccountConfig {
    /// 启用远程浏览器时给出端点
    pub fn remote_endpoint(&self) -> Option<RemoteEndpoint> {
        if self.use_remote {
            Some(RemoteEndpoint {
                protocol: self.remote_protocol.clone(),
                host: self.remote_host.clone(),
                port: self.remote_port,
            })
        } else {
            None
        }
    }
}

/// 凭据存储
pub struct CredentialStore {
    data_dir: PathBuf,
    cipher: Aes256Gcm,
}

impl CredentialStore {
    /// 打开数据目录下的凭据存储；密钥不存在时生成并落盘
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("创建数据目录失败: {}", data_dir.display()))?;

        let key_path = data_dir.join(KEY_FILE);
        let key_bytes = load_or_create_key(&key_path).await?;
        let cipher = Aes256Gcm::new_from_slice(&key_bytes).map_err(|_| {
            AppError::Store(StoreError::KeyCorrupted {
                path: key_path.display().to_string(),
            })
        })?;

        Ok(Self { data_dir, cipher })
    }

    fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// 加密一段明文 → base64(nonce ‖ 密文)
    pub fn encrypt(&self, plain: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plain.as_bytes())
            .map_err(|_| AppError::Store(StoreError::EncryptFailed))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(combined))
    }

    /// 解密 base64(nonce ‖ 密文)
    pub fn decrypt(&self, stored: &str) -> Result<String> {
        let raw = BASE64
            .decode(stored)
            .map_err(|_| AppError::Store(StoreError::DecryptFailed))?;
        if raw.len() <= NONCE_LEN {
            return Err(AppError::Store(StoreError::DecryptFailed).into());
        }
        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| AppError::Store(StoreError::DecryptFailed))?;
        let text =
            String::from_utf8(plain).map_err(|_| AppError::Store(StoreError::DecryptFailed))?;
        Ok(text)
    }

    /// 读取账号配置；密码字段就地解密
    ///
    /// 旧版本曾以明文保存密码：解密失败时按明文返回（惰性迁移，
    /// 下次 save 就转为密文）。文件缺失或损坏一律回到默认配置。
    pub async fn load(&self) -> AccountConfig {
        let path = self.config_path();
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(_) => {
                debug!("账号配置不存在，使用默认值: {}", path.display());
                return AccountConfig::default();
            }
        };
        let mut config: AccountConfig = match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("⚠️ 账号配置损坏，使用默认值: {}", e);
                return AccountConfig::default();
            }
        };
        if !config.password.is_empty() {
            match self.decrypt(&config.password) {
                Ok(plain) => config.password = plain,
                Err(_) => debug!("密码字段不是密文，按旧版明文处理"),
            }
        }
        config
    }

    /// 保存账号配置；密码非空时先加密再落盘
    pub async fn save(&self, config: &AccountConfig) -> Result<()> {
        let mut stored = config.clone();
        if !stored.password.is_empty() {
            stored.password = self.encrypt(&stored.password)?;
        }
        let content = serde_json::to_string_pretty(&stored)?;
        let path = self.config_path();
        fs::write(&path, content)
            .await
            .with_context(|| format!("写入账号配置失败: {}", path.display()))?;
        Ok(())
    }
}

/// 读取或生成 32 字节密钥（base64 落盘）
///
/// 密钥文件存在但无法解出 32 字节时直接报错，不悄悄换新钥匙，
/// 否则旧密文将永远无法恢复。
async fn load_or_create_key(path: &Path) -> Result<[u8; 32]> {
    if let Ok(content) = fs::read_to_string(path).await {
        let decoded = BASE64.decode(content.trim()).map_err(|_| {
            AppError::Store(StoreError::KeyCorrupted {
                path: path.display().to_string(),
            })
        })?;
        let key: [u8; 32] = decoded.try_into().map_err(|_| {
            AppError::Store(StoreError::KeyCorrupted {
                path: path.display().to_string(),
            })
        })?;
        return Ok(key);
    }

    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    fs::write(path, BASE64.encode(key))
        .await
        .with_context(|| format!("写入密钥文件失败: {}", path.display()))?;
    debug!("已生成新密钥: {}", path.display());
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_encrypt_decrypt_roundtrip() {
        let temp = tempdir().unwrap();
        let store = CredentialStore::open(temp.path()).await.unwrap();

        let encrypted = store.encrypt("s3cret-пароль").unwrap();
        assert_ne!(encrypted, "s3cret-пароль");
        assert_eq!(store.decrypt(&encrypted).unwrap(), "s3cret-пароль");
    }

    #[tokio::test]
    async fn test_encrypt_uses_fresh_nonce() {
        let temp = tempdir().unwrap();
        let store = CredentialStore::open(temp.path()).await.unwrap();

        // 同一明文两次加密必须产出不同密文
        let first = store.encrypt("same").unwrap();
        let second = store.encrypt("same").unwrap();
        assert_ne!(first, second);
        assert_eq!(store.decrypt(&first).unwrap(), "same");
        assert_eq!(store.decrypt(&second).unwrap(), "same");
    }

    #[tokio::test]
    async fn test_save_writes_ciphertext_and_load_restores() {
        let temp = tempdir().unwrap();
        let store = CredentialStore::open(temp.path()).await.unwrap();

        let config = AccountConfig {
            email: "user@example.org".to_string(),
            password: "hunter2".to_string(),
            ..AccountConfig::default()
        };
        store.save(&config).await.unwrap();

        // 落盘文件里不能出现明文密码
        let raw = std::fs::read_to_string(temp.path().join(CONFIG_FILE)).unwrap();
        assert!(!raw.contains("hunter2"));

        let loaded = store.load().await;
        assert_eq!(loaded.email, "user@example.org");
        assert_eq!(loaded.password, "hunter2");
    }

    #[tokio::test]
    async fn test_legacy_plaintext_password_passes_through() {
        let temp = tempdir().unwrap();
        let store = CredentialStore::open(temp.path()).await.unwrap();

        // 旧版配置：密码按明文落盘
        let legacy = r#"{"email":"old@example.org","password":"plain-old"}"#;
        std::fs::write(temp.path().join(CONFIG_FILE), legacy).unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded.password, "plain-old");
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_config_falls_back_to_default() {
        let temp = tempdir().unwrap();
        let store = CredentialStore::open(temp.path()).await.unwrap();
        assert_eq!(store.load().await.email, "");

        std::fs::write(temp.path().join(CONFIG_FILE), "{not json").unwrap();
        let loaded = store.load().await;
        assert_eq!(loaded.email, "");
        assert_eq!(loaded.remote_port, 3000);
    }

    #[tokio::test]
    async fn test_key_survives_reopen() {
        let temp = tempdir().unwrap();
        let first = CredentialStore::open(temp.path()).await.unwrap();
        let encrypted = first.encrypt("durable").unwrap();
        drop(first);

        // 重新打开使用同一把密钥
        let second = CredentialStore::open(temp.path()).await.unwrap();
        assert_eq!(second.decrypt(&encrypted).unwrap(), "durable");
    }

    #[tokio::test]
    async fn test_corrupt_key_file_is_an_error() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(KEY_FILE), "not-base64!!").unwrap();

        // 坏钥匙必须报错，换新钥匙会让旧密文永远无法恢复
        assert!(CredentialStore::open(temp.path()).await.is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = AccountConfig {
            password: "top-secret".to_string(),
            ..AccountConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("top-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_remote_endpoint_only_when_enabled() {
        let mut config = AccountConfig::default();
        assert!(config.remote_endpoint().is_none());

        config.use_remote = true;
        config.remote_host = "10.0.0.5".to_string();
        let endpoint = config.remote_endpoint().unwrap();
        assert_eq!(endpoint.address(), "ws://10.0.0.5:3000");
    }
}
