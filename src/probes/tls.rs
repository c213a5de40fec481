// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - TLS Inspection Probe
 * Handshakes without trust validation and extracts the presented leaf certificate
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{AlertDescription, ClientConfig, DigitallySignedStruct, SignatureScheme};
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::debug;
use x509_parser::prelude::{FromDer, GeneralName, X509Certificate};
use x509_parser::public_key::PublicKey;

use super::TlsProbe;
use crate::errors::{NetworkError, ScannerError, ScannerResult};

/// Signature algorithm OIDs considered broken
const WEAK_SIGNATURE_OIDS: &[(&str, &str)] = &[
    ("1.2.840.113549.1.1.4", "md5WithRSAEncryption"),
    ("1.2.840.113549.1.1.5", "sha1WithRSAEncryption"),
    ("1.2.840.10040.4.3", "dsaWithSHA1"),
    ("1.2.840.10045.4.1", "ecdsaWithSHA1"),
];

/// What the server presented during the handshake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    pub common_name: Option<String>,
    pub san_dns_names: Vec<String>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub self_signed: bool,
    /// RSA modulus size, `None` for non-RSA keys
    pub rsa_key_bits: Option<usize>,
    pub signature_algorithm: String,
    /// Name of the weak algorithm when the signature uses MD5 or SHA-1
    pub weak_signature: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsInspection {
    pub certificate: CertificateInfo,
    /// e.g. `TLSv1_3`
    pub protocol: String,
    /// e.g. `TLS13_AES_256_GCM_SHA384`
    pub cipher: String,
}

/// Accepts whatever chain the server presents. Handshake signatures are
/// still checked so the peer must hold the certificate's key.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

pub struct RustlsTlsProbe {
    connector: TlsConnector,
    timeout: Duration,
}

impl RustlsTlsProbe {
    pub fn new(handshake_timeout: Duration) -> ScannerResult<Self> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .map_err(|e| ScannerError::Configuration(format!("TLS client setup: {}", e)))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            timeout: handshake_timeout,
        })
    }

    async fn handshake(&self, host: &str, port: u16) -> ScannerResult<TlsInspection> {
        let tls_failure = |reason: String| -> ScannerError {
            NetworkError::TlsHandshakeFailed {
                host: host.to_string(),
                reason,
            }
            .into()
        };

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| ScannerError::Validation(format!("Invalid server name {}: {}", host, e)))?;

        let tcp = TcpStream::connect((host, port)).await.map_err(|e| {
            ScannerError::from(NetworkError::ConnectionRefused {
                url: format!("{}:{} ({})", host, port, e),
            })
        })?;

        let stream = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| classify_handshake_error(host, &e))?;

        let (_, connection) = stream.get_ref();

        let leaf = connection
            .peer_certificates()
            .and_then(|chain| chain.first())
            .ok_or_else(|| tls_failure("server presented no certificate".to_string()))?;

        let certificate = parse_certificate(leaf.as_ref()).map_err(tls_failure)?;

        let protocol = connection
            .protocol_version()
            .map(|v| format!("{:?}", v))
            .unwrap_or_else(|| "unknown".to_string());
        let cipher = connection
            .negotiated_cipher_suite()
            .map(|s| format!("{:?}", s.suite()))
            .unwrap_or_else(|| "unknown".to_string());

        Ok(TlsInspection {
            certificate,
            protocol,
            cipher,
        })
    }
}

#[async_trait]
impl TlsProbe for RustlsTlsProbe {
    async fn inspect(&self, host: &str, port: u16) -> ScannerResult<TlsInspection> {
        match timeout(self.timeout, self.handshake(host, port)).await {
            Ok(result) => {
                if let Err(e) = &result {
                    debug!(host, port, outcome = "refused", error = %e, "TLS inspection failed");
                }
                result
            }
            Err(_) => {
                debug!(host, port, outcome = "timeout", "TLS handshake timed out");
                Err(ScannerError::Timeout {
                    duration: self.timeout,
                })
            }
        }
    }
}

/// Whether rustls gave up because the server only speaks TLS 1.1 or older.
/// The client offers TLS 1.2 and 1.3 only, so a version or handshake
/// alert from the server means nothing modern was acceptable to it.
pub fn is_legacy_rejection(err: &rustls::Error) -> bool {
    matches!(
        err,
        rustls::Error::PeerIncompatible(_)
            | rustls::Error::AlertReceived(
                AlertDescription::ProtocolVersion
                    | AlertDescription::HandshakeFailure
                    | AlertDescription::InsufficientSecurity
            )
    )
}

/// tokio-rustls reports handshake failures as `io::Error` wrapping the rustls error
fn classify_handshake_error(host: &str, err: &io::Error) -> ScannerError {
    let legacy = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        .is_some_and(is_legacy_rejection);

    let host = host.to_string();
    let reason = err.to_string();
    if legacy {
        NetworkError::LegacyTlsOnly { host, reason }.into()
    } else {
        NetworkError::TlsHandshakeFailed { host, reason }.into()
    }
}

/// Extract the fields the certificate checks need from a DER certificate
pub fn parse_certificate(der: &[u8]) -> Result<CertificateInfo, String> {
    let (_, cert) =
        X509Certificate::from_der(der).map_err(|e| format!("invalid certificate: {}", e))?;

    let validity = cert.validity();
    let not_before = timestamp(validity.not_before.timestamp())?;
    let not_after = timestamp(validity.not_after.timestamp())?;

    let common_name = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(|cn| cn.to_string());

    let san_dns_names = match cert.subject_alternative_name() {
        Ok(Some(san)) => san
            .value
            .general_names
            .iter()
            .filter_map(|name| match name {
                GeneralName::DNSName(dns) => Some(dns.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    let rsa_key_bits = match cert.public_key().parsed() {
        Ok(PublicKey::RSA(rsa)) => Some(rsa.key_size()),
        _ => None,
    };

    let signature_algorithm = cert.signature_algorithm.algorithm.to_id_string();
    let weak_signature = WEAK_SIGNATURE_OIDS
        .iter()
        .find(|(oid, _)| *oid == signature_algorithm)
        .map(|(_, name)| name.to_string());

    Ok(CertificateInfo {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        common_name,
        san_dns_names,
        not_before,
        not_after,
        self_signed: cert.subject().as_raw() == cert.issuer().as_raw(),
        rsa_key_bits,
        signature_algorithm,
        weak_signature,
    })
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, String> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| format!("certificate time out of range: {}", secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_der_is_rejected() {
        assert!(parse_certificate(&[0x30, 0x03, 0x02, 0x01]).is_err());
    }

    #[test]
    fn test_inspector_builds_with_ring_provider() {
        assert!(RustlsTlsProbe::new(Duration::from_secs(1)).is_ok());
    }

    #[tokio::test]
    async fn test_closed_port_is_an_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = RustlsTlsProbe::new(Duration::from_secs(2)).unwrap();
        assert!(probe.inspect("127.0.0.1", port).await.is_err());
    }

    #[test]
    fn test_version_rejections_are_legacy() {
        assert!(is_legacy_rejection(&rustls::Error::AlertReceived(
            AlertDescription::ProtocolVersion
        )));
        assert!(is_legacy_rejection(&rustls::Error::AlertReceived(
            AlertDescription::HandshakeFailure
        )));
        assert!(is_legacy_rejection(&rustls::Error::PeerIncompatible(
            rustls::PeerIncompatible::ServerDoesNotSupportTls12Or13
        )));
        assert!(!is_legacy_rejection(&rustls::Error::AlertReceived(
            AlertDescription::BadCertificate
        )));
        assert!(!is_legacy_rejection(&rustls::Error::General("eof".into())));
    }

    #[test]
    fn test_handshake_errors_are_classified() {
        let alert = io::Error::new(
            io::ErrorKind::InvalidData,
            rustls::Error::AlertReceived(AlertDescription::ProtocolVersion),
        );
        assert!(matches!(
            classify_handshake_error("old.example.com", &alert),
            ScannerError::Network(NetworkError::LegacyTlsOnly { ref host, .. })
                if host == "old.example.com"
        ));

        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        assert!(matches!(
            classify_handshake_error("example.com", &reset),
            ScannerError::Network(NetworkError::TlsHandshakeFailed { .. })
        ));
    }
}
