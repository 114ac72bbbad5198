/// Build-time settings a firmware image cannot boot without.
const REQUIRED_FIRMWARE_ENV: [&str; 5] = [
    "IOTNODE_WIFI_SSID",
    "IOTNODE_WIFI_PASSWORD",
    "IOTNODE_HOSTNAME",
    "IOTNODE_CERT_PATH",
    "IOTNODE_KEY_PATH",
];

fn main() {
    for var in REQUIRED_FIRMWARE_ENV {
        println!("cargo:rerun-if-env-changed={}", var);
    }
    println!("cargo:rerun-if-env-changed=IOTNODE_COAP_SECURE");

    // Firmware builds bake station credentials and the DTLS identity into the image
    if std::env::var_os("CARGO_FEATURE_ESP32").is_some() {
        let missing: Vec<&str> = REQUIRED_FIRMWARE_ENV
            .iter()
            .copied()
            .filter(|var| std::env::var_os(var).map_or(true, |v| v.is_empty()))
            .collect();
        if !missing.is_empty() {
            panic!(
                "missing firmware configuration: {} must be set at build time\n\n\
                 Example:\n  \
                 IOTNODE_WIFI_SSID=\"MyNetwork\" IOTNODE_WIFI_PASSWORD=\"secret123\" \
                 IOTNODE_HOSTNAME=\"iotnode\" IOTNODE_CERT_PATH=certs/iotnode.crt \
                 IOTNODE_KEY_PATH=certs/iotnode.key cargo build --features esp32",
                missing.join(", ")
            );
        }
        for var in ["IOTNODE_CERT_PATH", "IOTNODE_KEY_PATH"] {
            if let Some(path) = std::env::var_os(var) {
                println!("cargo:rerun-if-changed={}", path.to_string_lossy());
            }
        }
    }

    // Only run ESP-IDF build system when targeting ESP32 (Xtensa architecture)
    // Build scripts run on the host, so we check the TARGET env var
    if let Ok(target) = std::env::var("TARGET") {
        if target.contains("xtensa") {
            embuild::espidf::sysenv::output();
        }
    }
}
