//! Hardware-vendor lookup against a built-in OUI prefix table.
//!
//! Pure local lookup, no I/O; the only failure mode is "not found".

/// OUI prefixes (first three octets, lower-cased) to vendor names.
/// A pruned copy of the IEEE registry covering vendors common on
/// residential and small-office segments.
const OUI_TABLE: &[(&str, &str)] = &[
    ("00:00:0c", "Cisco Systems, Inc"),
    ("00:00:5e", "IANA"),
    ("00:01:42", "Cisco Systems, Inc"),
    ("00:03:93", "Apple, Inc."),
    ("00:0c:29", "VMware, Inc."),
    ("00:0d:3a", "Microsoft Corporation"),
    ("00:0f:fe", "Intel Corporate"),
    ("00:15:5d", "Microsoft Corporation"),
    ("00:17:f2", "Apple, Inc."),
    ("00:18:8b", "Microsoft Corporation"),
    ("00:1a:11", "Samsung Electronics Co.,Ltd"),
    ("00:1b:63", "Apple, Inc."),
    ("00:1c:b3", "Apple, Inc."),
    ("00:22:48", "Microsoft Corporation"),
    ("00:26:bb", "Apple, Inc."),
    ("00:50:56", "VMware, Inc."),
    ("08:00:27", "Oracle VirtualBox"),
    ("18:b4:30", "Nest Labs Inc."),
    ("28:6c:07", "Xiaomi Communications Co Ltd"),
    ("30:9c:23", "Espressif Inc."),
    ("3c:5a:b4", "Google, Inc."),
    ("44:65:0d", "Amazon Technologies Inc."),
    ("50:c7:bf", "TP-Link Technologies Co.,Ltd"),
    ("58:55:ca", "Apple, Inc."),
    ("5c:cf:7f", "Espressif Inc."),
    ("74:da:38", "Edimax Technology Co. Ltd."),
    ("78:8a:20", "Ubiquiti Inc"),
    ("7c:dd:90", "Shenzhen Ogemray Technology Co.,Ltd"),
    ("84:d6:d0", "Amazon Technologies Inc."),
    ("8c:85:90", "Apple, Inc."),
    ("94:10:3e", "Belkin International Inc."),
    ("a0:ce:c8", "CE LINK LIMITED"),
    ("a4:5e:60", "Apple, Inc."),
    ("ac:63:be", "Amazon Technologies Inc."),
    ("b0:be:76", "TP-Link Technologies Co.,Ltd"),
    ("b4:fb:e4", "Ubiquiti Inc"),
    ("b8:27:eb", "Raspberry Pi Foundation"),
    ("c8:3a:35", "Tenda Technology Co.,Ltd"),
    ("cc:32:e5", "TP-Link Technologies Co.,Ltd"),
    ("d8:27:27", "Samsung Electronics Co.,Ltd"),
    ("dc:a6:32", "Raspberry Pi Trading Ltd"),
    ("e4:5f:01", "Raspberry Pi Trading Ltd"),
    ("ec:fa:bc", "Xiaomi Communications Co Ltd"),
    ("f0:9f:c2", "Ubiquiti Inc"),
    ("f4:f5:d8", "Google, Inc."),
];

/// Look up the vendor for a link address. Accepts `:` or `-` separators
/// and any case.
pub fn lookup(mac: &str) -> Option<String> {
    let normalized = mac.to_ascii_lowercase().replace('-', ":");
    let prefix = normalized.get(..8)?;
    OUI_TABLE
        .iter()
        .find(|(oui, _)| *oui == prefix)
        .map(|(_, vendor)| vendor.to_string())
}
