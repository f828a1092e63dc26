use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptionRule {
    pub algorithm: Option<String>,
    pub kms_master_key_id: Option<String>,
    pub bucket_key_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptionConfiguration {
    pub rules: Vec<EncryptionRule>,
}

impl EncryptionConfiguration {
    /// First rule that names a default algorithm.
    pub fn default_rule(&self) -> Option<&EncryptionRule> {
        self.rules.iter().find(|rule| rule.algorithm.is_some())
    }
}

/// What the remote API said about a bucket's default encryption.
///
/// `NotConfigured` is the distinguishable "no configuration" signal and must
/// never be produced for permission or transport failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptionLookup {
    Found(EncryptionConfiguration),
    NotConfigured,
    OtherError(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EncryptionStatus {
    Encrypted {
        algorithm: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        kms_master_key_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        bucket_key_enabled: Option<bool>,
    },
    Unencrypted,
    Indeterminate { reason: String },
}

impl EncryptionStatus {
    pub fn is_finding(&self) -> bool {
        matches!(self, Self::Unencrypted)
    }
}

pub fn classify(lookup: EncryptionLookup) -> EncryptionStatus {
    match lookup {
        EncryptionLookup::Found(configuration) => match configuration.default_rule() {
            Some(EncryptionRule {
                algorithm: Some(algorithm),
                kms_master_key_id,
                bucket_key_enabled,
            }) => EncryptionStatus::Encrypted {
                algorithm: algorithm.clone(),
                kms_master_key_id: kms_master_key_id.clone(),
                bucket_key_enabled: *bucket_key_enabled,
            },
            _ => EncryptionStatus::Indeterminate {
                reason: "encryption configuration has no default algorithm".to_string(),
            },
        },
        EncryptionLookup::NotConfigured => EncryptionStatus::Unencrypted,
        EncryptionLookup::OtherError(detail) => EncryptionStatus::Indeterminate { reason: detail },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketAudit {
    pub bucket: String,
    #[serde(flatten)]
    pub status: EncryptionStatus,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sse(algorithm: &str) -> EncryptionConfiguration {
        EncryptionConfiguration {
            rules: vec![EncryptionRule {
                algorithm: Some(algorithm.to_string()),
                ..EncryptionRule::default()
            }],
        }
    }

    #[test]
    fn found_configuration_is_encrypted_with_algorithm() {
        assert_eq!(
            classify(EncryptionLookup::Found(sse("AES256"))),
            EncryptionStatus::Encrypted {
                algorithm: "AES256".to_string(),
                kms_master_key_id: None,
                bucket_key_enabled: None,
            }
        );
    }

    #[test]
    fn kms_details_come_from_the_rule_that_names_the_algorithm() {
        let configuration = EncryptionConfiguration {
            rules: vec![
                EncryptionRule {
                    bucket_key_enabled: Some(false),
                    ..EncryptionRule::default()
                },
                EncryptionRule {
                    algorithm: Some("aws:kms".to_string()),
                    kms_master_key_id: Some("alias/audit-logs".to_string()),
                    bucket_key_enabled: Some(true),
                },
            ],
        };

        assert_eq!(
            classify(EncryptionLookup::Found(configuration)),
            EncryptionStatus::Encrypted {
                algorithm: "aws:kms".to_string(),
                kms_master_key_id: Some("alias/audit-logs".to_string()),
                bucket_key_enabled: Some(true),
            }
        );
    }

    #[test]
    fn not_configured_and_other_errors_stay_distinct() {
        let unencrypted = classify(EncryptionLookup::NotConfigured);
        let indeterminate = classify(EncryptionLookup::OtherError("AccessDenied".to_string()));

        assert!(unencrypted.is_finding());
        assert!(!indeterminate.is_finding());
        assert_eq!(
            indeterminate,
            EncryptionStatus::Indeterminate {
                reason: "AccessDenied".to_string()
            }
        );
    }

    #[test]
    fn configuration_without_algorithm_is_indeterminate() {
        let status = classify(EncryptionLookup::Found(EncryptionConfiguration {
            rules: vec![EncryptionRule::default()],
        }));
        assert!(matches!(status, EncryptionStatus::Indeterminate { .. }));
    }

    #[test]
    fn bucket_audit_serializes_flat() {
        let audit = BucketAudit {
            bucket: "logs".to_string(),
            status: EncryptionStatus::Encrypted {
                algorithm: "AES256".to_string(),
                kms_master_key_id: None,
                bucket_key_enabled: None,
            },
        };
        assert_eq!(
            serde_json::to_value(&audit).expect("audit should serialize"),
            json!({"bucket": "logs", "status": "encrypted", "algorithm": "AES256"})
        );

        let audit = BucketAudit {
            bucket: "billing".to_string(),
            status: EncryptionStatus::Encrypted {
                algorithm: "aws:kms".to_string(),
                kms_master_key_id: Some("alias/billing".to_string()),
                bucket_key_enabled: Some(true),
            },
        };
        assert_eq!(
            serde_json::to_value(&audit).expect("audit should serialize"),
            json!({
                "bucket": "billing",
                "status": "encrypted",
                "algorithm": "aws:kms",
                "kms_master_key_id": "alias/billing",
                "bucket_key_enabled": true
            })
        );
    }
}
