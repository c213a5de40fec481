// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Finding Message Catalog
 * Per-language titles, descriptions and recommendations keyed by finding kind
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::FindingKind;

/// Output language for finding text
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "english" => Ok(Language::En),
            "es" | "es-ar" | "es-es" | "spanish" | "espanol" => Ok(Language::Es),
            other => Err(format!("Unsupported language: {}", other)),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendered finding text
#[derive(Debug, Clone, PartialEq)]
pub struct LocalizedText {
    pub title: String,
    pub description: String,
    pub recommendation: String,
}

struct Template {
    title: &'static str,
    description: &'static str,
    recommendation: &'static str,
}

const fn t(title: &'static str, description: &'static str, recommendation: &'static str) -> Template {
    Template {
        title,
        description,
        recommendation,
    }
}

/// Render the text for `kind` in `language`, substituting `{name}` placeholders
pub fn localize(language: Language, kind: FindingKind, params: &[(&str, &str)]) -> LocalizedText {
    let template = match language {
        Language::En => english(kind),
        Language::Es => spanish(kind),
    };

    LocalizedText {
        title: render(template.title, params),
        description: render(template.description, params),
        recommendation: render(template.recommendation, params),
    }
}

fn render(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in params {
        out = out.replace(&format!("{{{}}}", name), value);
    }
    out
}

fn english(kind: FindingKind) -> Template {
    match kind {
        FindingKind::SpfMissing => t(
            "SPF record missing",
            "No SPF record was found for {domain}. Anyone can send email that appears to come from this domain.",
            "Publish a TXT record starting with v=spf1 that lists your mail servers and ends with -all or ~all.",
        ),
        FindingKind::SpfPermissive => t(
            "SPF record allows any sender",
            "The SPF record ends with +all, which authorizes every server on the internet: {record}",
            "Replace +all with -all (reject) or ~all (soft fail) after listing your legitimate senders.",
        ),
        FindingKind::SpfNoAllMechanism => t(
            "SPF record has no enforcing 'all' mechanism",
            "The SPF record does not end with -all or ~all, so unauthorized senders are not rejected: {record}",
            "Terminate the SPF record with -all or ~all.",
        ),
        FindingKind::SpfTooManyLookups => t(
            "SPF record exceeds the DNS lookup limit",
            "The SPF record contains {count} include mechanisms; receivers stop evaluating after 10 DNS lookups.",
            "Flatten the SPF record or remove unused includes to stay under 10 lookups.",
        ),
        FindingKind::DkimMissing => t(
            "DKIM not configured",
            "No DKIM key was found under the common selectors ({selectors}). Outgoing mail is probably not signed.",
            "Enable DKIM signing with your mail provider and publish the public key at <selector>._domainkey.",
        ),
        FindingKind::DmarcMissing => t(
            "DMARC record missing",
            "No DMARC record was found at _dmarc.{domain}. Receivers have no policy for mail that fails SPF or DKIM.",
            "Publish a TXT record at _dmarc with v=DMARC1; p=quarantine (or reject) and a rua= reporting address.",
        ),
        FindingKind::DmarcPolicyNone => t(
            "DMARC policy too permissive",
            "The DMARC policy is p=none, so spoofed mail is still delivered: {record}",
            "Move to p=quarantine and then p=reject once reports show legitimate mail passes.",
        ),
        FindingKind::DmarcNoReporting => t(
            "DMARC reporting not configured",
            "The DMARC record has no rua= or ruf= address, so you receive no visibility into spoofing attempts.",
            "Add rua=mailto:<address> to receive aggregate DMARC reports.",
        ),
        FindingKind::DmarcPartialCoverage => t(
            "DMARC applies to a fraction of mail",
            "The DMARC policy is only applied to {pct}% of messages.",
            "Set pct=100 (or remove the tag) once the policy is validated.",
        ),
        FindingKind::HttpsUnavailable => t(
            "HTTPS not available",
            "A TLS connection to {domain}:443 could not be established ({reason}).",
            "Serve the site over HTTPS with a certificate from a trusted authority.",
        ),
        FindingKind::CertificateExpired => t(
            "SSL certificate expired",
            "The certificate expired on {date} ({days} days ago). Browsers show a security error to every visitor.",
            "Renew the certificate immediately and automate renewal (for example with ACME).",
        ),
        FindingKind::CertificateNotYetValid => t(
            "SSL certificate not yet valid",
            "The certificate is only valid from {date}.",
            "Check the server clock and install a certificate that is currently valid.",
        ),
        FindingKind::CertificateExpiringSoon => t(
            "SSL certificate expires in {days} days",
            "The certificate expires on {date}. Once it expires visitors will see security errors.",
            "Renew the certificate now and enable automatic renewal.",
        ),
        FindingKind::CertificateExpiring => t(
            "SSL certificate expires in {days} days",
            "The certificate expires on {date}.",
            "Plan the renewal and verify that automatic renewal is working.",
        ),
        FindingKind::CertificateHostnameMismatch => t(
            "Certificate does not match the domain",
            "The certificate is issued for {names}, which does not cover {domain}.",
            "Install a certificate whose subject or SAN list includes this domain.",
        ),
        FindingKind::CertificateSelfSigned => t(
            "Self-signed certificate",
            "The certificate is signed by itself ({issuer}) and is not trusted by browsers.",
            "Use a certificate issued by a trusted certificate authority.",
        ),
        FindingKind::CertificateWeakKey => t(
            "Weak certificate key or signature",
            "The certificate uses weak cryptography: {detail}.",
            "Reissue the certificate with an RSA key of at least 2048 bits (or ECDSA) and a SHA-256 signature.",
        ),
        FindingKind::WeakTlsConfiguration => t(
            "Weak TLS configuration",
            "The server negotiated {protocol} with cipher {cipher}.",
            "Disable SSLv2, SSLv3 and TLS 1.0 and remove RC4/DES cipher suites.",
        ),
        FindingKind::PlaintextHttpServed => t(
            "Site served over plain HTTP",
            "http://{domain} returns content instead of redirecting to HTTPS.",
            "Redirect all HTTP traffic to HTTPS with a 301 response.",
        ),
        FindingKind::InsecureRedirect => t(
            "HTTP redirect does not lead to HTTPS",
            "http:// requests are redirected to a non-HTTPS location: {location}",
            "Point the HTTP redirect at the https:// version of the site.",
        ),
        FindingKind::HstsMissing => t(
            "Strict-Transport-Security header missing",
            "Without HSTS, browsers may connect over HTTP and are exposed to SSL stripping attacks.",
            "Add Strict-Transport-Security: max-age=31536000; includeSubDomains",
        ),
        FindingKind::HstsWeak => t(
            "Strict-Transport-Security max-age too short",
            "The HSTS header has a missing or short max-age: {value}",
            "Set max-age to at least 31536000 (one year).",
        ),
        FindingKind::CspMissing => t(
            "Content-Security-Policy header missing",
            "Without a CSP the browser has no restriction on which scripts may run, which makes XSS easier to exploit.",
            "Define a Content-Security-Policy, starting with default-src 'self'.",
        ),
        FindingKind::CspUnsafe => t(
            "Content-Security-Policy allows unsafe scripts",
            "The CSP permits {directives}, which weakens its protection against XSS.",
            "Remove unsafe-eval and replace unsafe-inline with nonces or hashes.",
        ),
        FindingKind::FrameOptionsMissing => t(
            "X-Frame-Options header missing",
            "The site can be embedded in frames on other origins, enabling clickjacking.",
            "Add X-Frame-Options: DENY (or SAMEORIGIN), or CSP frame-ancestors.",
        ),
        FindingKind::ContentTypeOptionsMissing => t(
            "X-Content-Type-Options header missing",
            "Browsers may MIME-sniff responses and execute content as a different type.",
            "Add X-Content-Type-Options: nosniff",
        ),
        FindingKind::XssProtectionMissing => t(
            "X-XSS-Protection header missing",
            "Legacy browsers will not enable their built-in XSS filter.",
            "Add X-XSS-Protection: 1; mode=block (or rely on a strict CSP).",
        ),
        FindingKind::XssProtectionDisabled => t(
            "X-XSS-Protection explicitly disabled",
            "The header is set to 0, turning off the browser XSS filter.",
            "Remove the header or set it to 1; mode=block.",
        ),
        FindingKind::ReferrerPolicyMissing => t(
            "Referrer-Policy header missing",
            "Full URLs may leak to third parties through the Referer header.",
            "Add Referrer-Policy: strict-origin-when-cross-origin",
        ),
        FindingKind::PermissionsPolicyMissing => t(
            "Permissions-Policy header missing",
            "Browser features such as camera, microphone and geolocation are not restricted.",
            "Add a Permissions-Policy that disables features the site does not use.",
        ),
        FindingKind::ServerVersionDisclosed => t(
            "Server version disclosed",
            "The Server header reveals the software and version in use: {value}",
            "Configure the web server to omit version information from the Server header.",
        ),
        FindingKind::PoweredByDisclosed => t(
            "Technology disclosed by X-Powered-By",
            "The X-Powered-By header reveals the application stack: {value}",
            "Remove the X-Powered-By header.",
        ),
        FindingKind::TelnetExposed => t(
            "Telnet exposed (port {port})",
            "Telnet transmits credentials in clear text and is open to the internet.",
            "Disable Telnet immediately and use SSH instead.",
        ),
        FindingKind::FileShareExposed => t(
            "{service} exposed (port {port})",
            "File sharing services are a frequent target of worms and ransomware.",
            "Block this port at the firewall immediately; never expose it to the internet.",
        ),
        FindingKind::DatabaseExposed => t(
            "{service} database exposed (port {port})",
            "The database port accepts connections from the internet.",
            "Restrict access by IP allow-list or VPN and bind the service to private interfaces.",
        ),
        FindingKind::RemoteDesktopExposed => t(
            "{service} remote access exposed (port {port})",
            "Remote desktop services are a common brute-force and exploitation target.",
            "Restrict access by IP allow-list or VPN and require strong authentication.",
        ),
        FindingKind::FtpExposed => t(
            "FTP exposed (port {port})",
            "FTP sends credentials and data without encryption.",
            "Replace FTP with SFTP or FTPS and restrict access by IP.",
        ),
        FindingKind::SshExposed => t(
            "SSH exposed (port {port})",
            "SSH is reachable from the internet and may be targeted by brute-force attempts.",
            "Restrict access by IP or VPN, disable password login and use key-based authentication.",
        ),
        FindingKind::MailServiceExposed => t(
            "{service} exposed (port {port})",
            "An unencrypted mail retrieval service is reachable from the internet.",
            "Use the TLS variants (993/995) and disable the plaintext ports.",
        ),
        FindingKind::DnsServiceExposed => t(
            "DNS service exposed (port {port})",
            "A DNS server is reachable; open resolvers can be abused for amplification attacks.",
            "Disable recursion for external clients or restrict the service by IP.",
        ),
        FindingKind::NoOpenPorts => t(
            "No common ports exposed",
            "None of the checked service ports accepted a connection.",
            "No action required; keep the firewall configuration under review.",
        ),
        FindingKind::LargeAttackSurface => t(
            "Large attack surface ({count} open ports)",
            "Many services are reachable from the internet: {ports}",
            "Close every port that does not need to be public.",
        ),
        FindingKind::HttpWithoutHttps => t(
            "HTTP available without HTTPS",
            "Port 80 is open but port 443 is closed, so traffic cannot be encrypted.",
            "Enable HTTPS on port 443 and redirect HTTP to it.",
        ),
        FindingKind::AlternativeWebPort => t(
            "Alternative web port open ({port})",
            "{service} on port {port} is reachable; development or admin services are often left exposed.",
            "Verify that this port is intentionally public; otherwise close it.",
        ),
        FindingKind::ScannerFailed => t(
            "{scanner} scan failed",
            "The {scanner} checks could not be completed: {reason}",
            "Run the scan again; if the problem persists, verify that the domain is reachable.",
        ),
    }
}

fn spanish(kind: FindingKind) -> Template {
    match kind {
        FindingKind::SpfMissing => t(
            "Registro SPF ausente",
            "No se encontró un registro SPF para {domain}. Cualquiera puede enviar correos que parezcan provenir de este dominio.",
            "Publique un registro TXT que comience con v=spf1, liste sus servidores de correo y termine en -all o ~all.",
        ),
        FindingKind::SpfPermissive => t(
            "El registro SPF permite cualquier remitente",
            "El registro SPF termina en +all, lo que autoriza a cualquier servidor de internet: {record}",
            "Reemplace +all por -all (rechazar) o ~all (fallo suave) después de listar los remitentes legítimos.",
        ),
        FindingKind::SpfNoAllMechanism => t(
            "El registro SPF no tiene un mecanismo 'all' restrictivo",
            "El registro SPF no termina en -all o ~all, por lo que no se rechazan remitentes no autorizados: {record}",
            "Termine el registro SPF con -all o ~all.",
        ),
        FindingKind::SpfTooManyLookups => t(
            "El registro SPF supera el límite de consultas DNS",
            "El registro SPF contiene {count} mecanismos include; los receptores dejan de evaluar tras 10 consultas DNS.",
            "Aplane el registro SPF o elimine includes innecesarios para quedar por debajo de 10 consultas.",
        ),
        FindingKind::DkimMissing => t(
            "DKIM no configurado",
            "No se encontró una clave DKIM en los selectores comunes ({selectors}). Probablemente el correo saliente no esté firmado.",
            "Active la firma DKIM en su proveedor de correo y publique la clave pública en <selector>._domainkey.",
        ),
        FindingKind::DmarcMissing => t(
            "Registro DMARC ausente",
            "No se encontró un registro DMARC en _dmarc.{domain}. Los receptores no tienen política para correos que fallan SPF o DKIM.",
            "Publique un registro TXT en _dmarc con v=DMARC1; p=quarantine (o reject) y una dirección de reportes rua=.",
        ),
        FindingKind::DmarcPolicyNone => t(
            "Política DMARC demasiado permisiva",
            "La política DMARC es p=none, por lo que el correo falsificado igualmente se entrega: {record}",
            "Cambie a p=quarantine y luego a p=reject cuando los reportes confirmen que el correo legítimo pasa.",
        ),
        FindingKind::DmarcNoReporting => t(
            "Reportes DMARC no configurados",
            "El registro DMARC no tiene dirección rua= ni ruf=, por lo que no tiene visibilidad de intentos de suplantación.",
            "Agregue rua=mailto:<dirección> para recibir reportes agregados de DMARC.",
        ),
        FindingKind::DmarcPartialCoverage => t(
            "DMARC se aplica solo a una parte del correo",
            "La política DMARC solo se aplica al {pct}% de los mensajes.",
            "Configure pct=100 (o elimine la etiqueta) una vez validada la política.",
        ),
        FindingKind::HttpsUnavailable => t(
            "HTTPS no disponible",
            "No se pudo establecer una conexión TLS con {domain}:443 ({reason}).",
            "Sirva el sitio por HTTPS con un certificado de una autoridad confiable.",
        ),
        FindingKind::CertificateExpired => t(
            "Certificado SSL vencido",
            "El certificado venció el {date} (hace {days} días). Los navegadores muestran un error de seguridad a cada visitante.",
            "Renueve el certificado de inmediato y automatice la renovación (por ejemplo con ACME).",
        ),
        FindingKind::CertificateNotYetValid => t(
            "Certificado SSL aún no válido",
            "El certificado solo es válido a partir del {date}.",
            "Revise el reloj del servidor e instale un certificado vigente.",
        ),
        FindingKind::CertificateExpiringSoon => t(
            "El certificado SSL vence en {days} días",
            "El certificado vence el {date}. Al vencer, los visitantes verán errores de seguridad.",
            "Renueve el certificado ahora y active la renovación automática.",
        ),
        FindingKind::CertificateExpiring => t(
            "El certificado SSL vence en {days} días",
            "El certificado vence el {date}.",
            "Planifique la renovación y verifique que la renovación automática funcione.",
        ),
        FindingKind::CertificateHostnameMismatch => t(
            "El certificado no corresponde al dominio",
            "El certificado fue emitido para {names}, que no cubre {domain}.",
            "Instale un certificado cuyo sujeto o lista SAN incluya este dominio.",
        ),
        FindingKind::CertificateSelfSigned => t(
            "Certificado autofirmado",
            "El certificado está firmado por sí mismo ({issuer}) y los navegadores no confían en él.",
            "Use un certificado emitido por una autoridad certificante confiable.",
        ),
        FindingKind::CertificateWeakKey => t(
            "Clave o firma del certificado débil",
            "El certificado usa criptografía débil: {detail}.",
            "Reemita el certificado con una clave RSA de al menos 2048 bits (o ECDSA) y firma SHA-256.",
        ),
        FindingKind::WeakTlsConfiguration => t(
            "Configuración TLS débil",
            "El servidor negoció {protocol} con el cifrado {cipher}.",
            "Deshabilite SSLv2, SSLv3 y TLS 1.0 y elimine los cifrados RC4/DES.",
        ),
        FindingKind::PlaintextHttpServed => t(
            "Sitio servido por HTTP sin cifrar",
            "http://{domain} devuelve contenido en lugar de redirigir a HTTPS.",
            "Redirija todo el tráfico HTTP a HTTPS con una respuesta 301.",
        ),
        FindingKind::InsecureRedirect => t(
            "La redirección HTTP no lleva a HTTPS",
            "Las solicitudes http:// se redirigen a una ubicación sin HTTPS: {location}",
            "Apunte la redirección HTTP a la versión https:// del sitio.",
        ),
        FindingKind::HstsMissing => t(
            "Falta el encabezado Strict-Transport-Security",
            "Sin HSTS, los navegadores pueden conectarse por HTTP y quedan expuestos a ataques de SSL stripping.",
            "Agregue Strict-Transport-Security: max-age=31536000; includeSubDomains",
        ),
        FindingKind::HstsWeak => t(
            "max-age de Strict-Transport-Security demasiado corto",
            "El encabezado HSTS tiene un max-age ausente o corto: {value}",
            "Configure max-age en al menos 31536000 (un año).",
        ),
        FindingKind::CspMissing => t(
            "Falta el encabezado Content-Security-Policy",
            "Sin CSP el navegador no restringe qué scripts pueden ejecutarse, lo que facilita explotar XSS.",
            "Defina una Content-Security-Policy, comenzando con default-src 'self'.",
        ),
        FindingKind::CspUnsafe => t(
            "Content-Security-Policy permite scripts inseguros",
            "La CSP permite {directives}, lo que debilita su protección contra XSS.",
            "Elimine unsafe-eval y reemplace unsafe-inline por nonces o hashes.",
        ),
        FindingKind::FrameOptionsMissing => t(
            "Falta el encabezado X-Frame-Options",
            "El sitio puede incrustarse en marcos de otros orígenes, lo que permite clickjacking.",
            "Agregue X-Frame-Options: DENY (o SAMEORIGIN), o CSP frame-ancestors.",
        ),
        FindingKind::ContentTypeOptionsMissing => t(
            "Falta el encabezado X-Content-Type-Options",
            "Los navegadores pueden inferir el tipo MIME y ejecutar contenido como otro tipo.",
            "Agregue X-Content-Type-Options: nosniff",
        ),
        FindingKind::XssProtectionMissing => t(
            "Falta el encabezado X-XSS-Protection",
            "Los navegadores antiguos no activarán su filtro XSS integrado.",
            "Agregue X-XSS-Protection: 1; mode=block (o use una CSP estricta).",
        ),
        FindingKind::XssProtectionDisabled => t(
            "X-XSS-Protection deshabilitado explícitamente",
            "El encabezado vale 0, lo que desactiva el filtro XSS del navegador.",
            "Elimine el encabezado o configúrelo en 1; mode=block.",
        ),
        FindingKind::ReferrerPolicyMissing => t(
            "Falta el encabezado Referrer-Policy",
            "Las URL completas pueden filtrarse a terceros a través del encabezado Referer.",
            "Agregue Referrer-Policy: strict-origin-when-cross-origin",
        ),
        FindingKind::PermissionsPolicyMissing => t(
            "Falta el encabezado Permissions-Policy",
            "Funciones del navegador como cámara, micrófono y geolocalización no están restringidas.",
            "Agregue una Permissions-Policy que deshabilite las funciones que el sitio no usa.",
        ),
        FindingKind::ServerVersionDisclosed => t(
            "Versión del servidor expuesta",
            "El encabezado Server revela el software y la versión en uso: {value}",
            "Configure el servidor web para omitir la versión en el encabezado Server.",
        ),
        FindingKind::PoweredByDisclosed => t(
            "Tecnología expuesta por X-Powered-By",
            "El encabezado X-Powered-By revela la tecnología de la aplicación: {value}",
            "Elimine el encabezado X-Powered-By.",
        ),
        FindingKind::TelnetExposed => t(
            "Telnet expuesto (puerto {port})",
            "Telnet transmite credenciales en texto plano y está abierto a internet.",
            "Deshabilite Telnet de inmediato y use SSH en su lugar.",
        ),
        FindingKind::FileShareExposed => t(
            "{service} expuesto (puerto {port})",
            "Los servicios de archivos compartidos son un blanco frecuente de gusanos y ransomware.",
            "Bloquee este puerto en el firewall de inmediato; nunca lo exponga a internet.",
        ),
        FindingKind::DatabaseExposed => t(
            "Base de datos {service} expuesta (puerto {port})",
            "El puerto de la base de datos acepta conexiones desde internet.",
            "Restrinja el acceso por lista de IP o VPN y asocie el servicio a interfaces privadas.",
        ),
        FindingKind::RemoteDesktopExposed => t(
            "Acceso remoto {service} expuesto (puerto {port})",
            "Los servicios de escritorio remoto son un blanco común de fuerza bruta y explotación.",
            "Restrinja el acceso por lista de IP o VPN y exija autenticación fuerte.",
        ),
        FindingKind::FtpExposed => t(
            "FTP expuesto (puerto {port})",
            "FTP envía credenciales y datos sin cifrar.",
            "Reemplace FTP por SFTP o FTPS y restrinja el acceso por IP.",
        ),
        FindingKind::SshExposed => t(
            "SSH expuesto (puerto {port})",
            "SSH es accesible desde internet y puede recibir intentos de fuerza bruta.",
            "Restrinja el acceso por IP o VPN, deshabilite el login por contraseña y use claves.",
        ),
        FindingKind::MailServiceExposed => t(
            "{service} expuesto (puerto {port})",
            "Un servicio de lectura de correo sin cifrar es accesible desde internet.",
            "Use las variantes con TLS (993/995) y deshabilite los puertos en texto plano.",
        ),
        FindingKind::DnsServiceExposed => t(
            "Servicio DNS expuesto (puerto {port})",
            "Hay un servidor DNS accesible; los resolvers abiertos pueden usarse para ataques de amplificación.",
            "Deshabilite la recursión para clientes externos o restrinja el servicio por IP.",
        ),
        FindingKind::NoOpenPorts => t(
            "No hay puertos comunes expuestos",
            "Ninguno de los puertos de servicio revisados aceptó una conexión.",
            "No se requiere acción; mantenga la configuración del firewall bajo revisión.",
        ),
        FindingKind::LargeAttackSurface => t(
            "Superficie de ataque amplia ({count} puertos abiertos)",
            "Muchos servicios son accesibles desde internet: {ports}",
            "Cierre todos los puertos que no necesiten ser públicos.",
        ),
        FindingKind::HttpWithoutHttps => t(
            "HTTP disponible sin HTTPS",
            "El puerto 80 está abierto pero el 443 está cerrado, por lo que el tráfico no puede cifrarse.",
            "Habilite HTTPS en el puerto 443 y redirija HTTP hacia él.",
        ),
        FindingKind::AlternativeWebPort => t(
            "Puerto web alternativo abierto ({port})",
            "{service} en el puerto {port} es accesible; los servicios de desarrollo o administración suelen quedar expuestos.",
            "Verifique que este puerto sea público intencionalmente; de lo contrario, ciérrelo.",
        ),
        FindingKind::ScannerFailed => t(
            "Falló el análisis de {scanner}",
            "No se pudieron completar las verificaciones de {scanner}: {reason}",
            "Ejecute el análisis nuevamente; si el problema persiste, verifique que el dominio sea accesible.",
        ),
    }
}
