fn main() {
    // Connection defaults are baked in from the build environment.
    for var in [
        "CO2MON_SCOPE_ID",
        "CO2MON_HUB_HOSTNAME",
        "CO2MON_DEVICE_ID",
        "CO2MON_SAS_TOKEN",
        "CO2MON_WIFI_SSID",
        "CO2MON_WIFI_PASSWORD",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
