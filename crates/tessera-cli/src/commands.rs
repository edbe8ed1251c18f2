//! Command handlers.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Subcommand};
use tessera_crypto::envelope::{CiphertextEnvelope, EnvelopeId};
use tessera_crypto::keys::{CipherKey, KeyRef, KeyUsage, PrivateKey, PublicKey, UnwrappedKey};
use tessera_crypto::{CryptoContext, RsaCryptoContext, SymmetricCryptoContext};
use tessera_provider::SoftwareProvider;
use tracing::info;

use crate::config::{CliConfig, ContextConfig};

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encrypt a file into a ciphertext envelope.
    Encrypt(Transfer),
    /// Decrypt a ciphertext envelope.
    Decrypt(Transfer),
    /// Sign a file; writes the signature envelope.
    Sign(Transfer),
    /// Verify a signature envelope. Exits with status 1 when invalid.
    Verify {
        #[arg(long)]
        context: String,
        #[arg(long = "in")]
        input: PathBuf,
        #[arg(long)]
        signature: PathBuf,
    },
    /// Describe a ciphertext envelope.
    Inspect {
        #[arg(long = "in")]
        input: PathBuf,
    },
}

/// Context plus input and output files.
#[derive(Debug, Args)]
pub struct Transfer {
    /// Identity of the configured context.
    #[arg(long)]
    pub context: String,
    #[arg(long = "in")]
    pub input: PathBuf,
    #[arg(long)]
    pub out: PathBuf,
}

/// A configured context of either kind.
pub enum AnyContext {
    Rsa(RsaCryptoContext<SoftwareProvider>),
    Symmetric(SymmetricCryptoContext<SoftwareProvider>),
}

impl CryptoContext for AnyContext {
    fn identity(&self) -> &str {
        match self {
            Self::Rsa(c) => c.identity(),
            Self::Symmetric(c) => c.identity(),
        }
    }

    async fn encrypt(&self, data: &[u8]) -> tessera_crypto::Result<Vec<u8>> {
        match self {
            Self::Rsa(c) => c.encrypt(data).await,
            Self::Symmetric(c) => c.encrypt(data).await,
        }
    }

    async fn decrypt(&self, data: &[u8]) -> tessera_crypto::Result<Vec<u8>> {
        match self {
            Self::Rsa(c) => c.decrypt(data).await,
            Self::Symmetric(c) => c.decrypt(data).await,
        }
    }

    async fn wrap(&self, key: KeyRef<'_>) -> tessera_crypto::Result<Vec<u8>> {
        match self {
            Self::Rsa(c) => c.wrap(key).await,
            Self::Symmetric(c) => c.wrap(key).await,
        }
    }

    async fn unwrap(
        &self,
        data: &[u8],
        algorithm: &str,
        usages: &[KeyUsage],
    ) -> tessera_crypto::Result<UnwrappedKey> {
        match self {
            Self::Rsa(c) => c.unwrap(data, algorithm, usages).await,
            Self::Symmetric(c) => c.unwrap(data, algorithm, usages).await,
        }
    }

    async fn sign(&self, data: &[u8]) -> tessera_crypto::Result<Vec<u8>> {
        match self {
            Self::Rsa(c) => c.sign(data).await,
            Self::Symmetric(c) => c.sign(data).await,
        }
    }

    async fn verify(&self, data: &[u8], signature: &[u8]) -> tessera_crypto::Result<bool> {
        match self {
            Self::Rsa(c) => c.verify(data, signature).await,
            Self::Symmetric(c) => c.verify(data, signature).await,
        }
    }
}

fn read_key(path: Option<&Path>) -> anyhow::Result<Option<Vec<u8>>> {
    path.map(|p| std::fs::read(p).with_context(|| format!("reading key {}", p.display())))
        .transpose()
}

/// Build a context, reading its key files.
pub fn build_context(config: &ContextConfig) -> anyhow::Result<AnyContext> {
    let provider = SoftwareProvider::new();
    match config {
        ContextConfig::Rsa {
            identity,
            mode,
            public_key,
            private_key,
        } => {
            let public = read_key(public_key.as_deref())?.map(|der| PublicKey::new("RSA", der));
            let private = read_key(private_key.as_deref())?.map(|der| PrivateKey::new("RSA", der));
            Ok(AnyContext::Rsa(RsaCryptoContext::new(
                provider,
                identity.clone(),
                private,
                public,
                *mode,
            )))
        }
        ContextConfig::Symmetric {
            identity,
            encryption_key,
            hmac_key,
            wrap_key,
        } => {
            let encryption =
                read_key(encryption_key.as_deref())?.map(|k| CipherKey::new("AES-CBC", k));
            let hmac = read_key(hmac_key.as_deref())?.map(|k| CipherKey::new("HmacSHA256", k));
            let wrap = read_key(wrap_key.as_deref())?.map(|k| CipherKey::new("AES-KW", k));
            Ok(AnyContext::Symmetric(SymmetricCryptoContext::new(
                provider,
                identity.clone(),
                encryption,
                hmac,
                wrap,
            )))
        }
    }
}

fn context_for(config: &CliConfig, identity: &str) -> anyhow::Result<AnyContext> {
    let entry = config
        .context(identity)
        .with_context(|| format!("no context named {identity:?} in configuration"))?;
    build_context(entry)
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn write_output(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, data).with_context(|| format!("writing {}", path.display()))
}

/// Human-readable summary of a ciphertext envelope.
pub fn describe(envelope: &CiphertextEnvelope) -> String {
    let id = match envelope.id() {
        EnvelopeId::KeyId(key_id) => format!("key id: {key_id}"),
        EnvelopeId::CipherSpec(spec) => format!("cipher spec: {spec}"),
    };
    let iv = envelope
        .iv()
        .map_or_else(|| "none".to_string(), |iv| format!("{} bytes", iv.len()));
    format!(
        "version: {}\n{id}\niv: {iv}\nciphertext: {} bytes",
        envelope.version(),
        envelope.ciphertext().len()
    )
}

/// Run one command. Returns `false` only when a signature did not verify.
pub async fn run(command: Command, config: &CliConfig) -> anyhow::Result<bool> {
    match command {
        Command::Encrypt(io) => {
            let ctx = context_for(config, &io.context)?;
            let out = ctx.encrypt(&read_input(&io.input)?).await?;
            write_output(&io.out, &out)?;
            info!(context = %io.context, bytes = out.len(), "Encrypted");
        }
        Command::Decrypt(io) => {
            let ctx = context_for(config, &io.context)?;
            let out = ctx.decrypt(&read_input(&io.input)?).await?;
            write_output(&io.out, &out)?;
            info!(context = %io.context, bytes = out.len(), "Decrypted");
        }
        Command::Sign(io) => {
            let ctx = context_for(config, &io.context)?;
            let out = ctx.sign(&read_input(&io.input)?).await?;
            write_output(&io.out, &out)?;
            info!(context = %io.context, bytes = out.len(), "Signed");
        }
        Command::Verify {
            context,
            input,
            signature,
        } => {
            let ctx = context_for(config, &context)?;
            let valid = ctx.verify(&read_input(&input)?, &read_input(&signature)?).await?;
            println!("{}", if valid { "valid" } else { "invalid" });
            return Ok(valid);
        }
        Command::Inspect { input } => {
            let envelope = CiphertextEnvelope::from_text(&read_input(&input)?, None)?;
            println!("{}", describe(&envelope));
        }
    }
    Ok(true)
}
