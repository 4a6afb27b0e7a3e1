//! Stable identifiers for data types, combining algorithms, status codes and
//! well-known attributes.
//!
//! Identifiers follow the XACML URN namespaces so documents written for other
//! engines keep working unchanged.

// Data types
pub const DATA_TYPE_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const DATA_TYPE_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const DATA_TYPE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const DATA_TYPE_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const DATA_TYPE_DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
pub const DATA_TYPE_TIME: &str = "http://www.w3.org/2001/XMLSchema#time";
pub const DATA_TYPE_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
pub const DATA_TYPE_ANY_URI: &str = "http://www.w3.org/2001/XMLSchema#anyURI";
pub const DATA_TYPE_HEX_BINARY: &str = "http://www.w3.org/2001/XMLSchema#hexBinary";
pub const DATA_TYPE_RFC822_NAME: &str = "urn:oasis:names:tc:xacml:1.0:data-type:rfc822Name";
pub const DATA_TYPE_X500_NAME: &str = "urn:oasis:names:tc:xacml:1.0:data-type:x500Name";

// Function namespace
pub const FUNCTION_PREFIX: &str = "urn:oasis:names:tc:xacml:1.0:function:";

// Rule combining algorithms
pub const RULE_DENY_OVERRIDES: &str =
    "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:deny-overrides";
pub const RULE_PERMIT_OVERRIDES: &str =
    "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:permit-overrides";
pub const RULE_FIRST_APPLICABLE: &str =
    "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable";
pub const RULE_ORDERED_DENY_OVERRIDES: &str =
    "urn:oasis:names:tc:xacml:1.1:rule-combining-algorithm:ordered-deny-overrides";
pub const RULE_ORDERED_PERMIT_OVERRIDES: &str =
    "urn:oasis:names:tc:xacml:1.1:rule-combining-algorithm:ordered-permit-overrides";

// Policy combining algorithms
pub const POLICY_DENY_OVERRIDES: &str =
    "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:deny-overrides";
pub const POLICY_PERMIT_OVERRIDES: &str =
    "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:permit-overrides";
pub const POLICY_FIRST_APPLICABLE: &str =
    "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:first-applicable";
pub const POLICY_ONLY_ONE_APPLICABLE: &str =
    "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:only-one-applicable";
pub const POLICY_ORDERED_DENY_OVERRIDES: &str =
    "urn:oasis:names:tc:xacml:1.1:policy-combining-algorithm:ordered-deny-overrides";
pub const POLICY_ORDERED_PERMIT_OVERRIDES: &str =
    "urn:oasis:names:tc:xacml:1.1:policy-combining-algorithm:ordered-permit-overrides";

// Status codes
pub const STATUS_OK: &str = "urn:oasis:names:tc:xacml:1.0:status:ok";
pub const STATUS_MISSING_ATTRIBUTE: &str = "urn:oasis:names:tc:xacml:1.0:status:missing-attribute";
pub const STATUS_SYNTAX_ERROR: &str = "urn:oasis:names:tc:xacml:1.0:status:syntax-error";
pub const STATUS_PROCESSING_ERROR: &str = "urn:oasis:names:tc:xacml:1.0:status:processing-error";

// Well-known attributes
pub const ATTR_SUBJECT_ID: &str = "urn:oasis:names:tc:xacml:1.0:subject:subject-id";
pub const ATTR_RESOURCE_ID: &str = "urn:oasis:names:tc:xacml:1.0:resource:resource-id";
pub const ATTR_RESOURCE_SCOPE: &str = "urn:oasis:names:tc:xacml:1.0:resource:scope";
pub const ATTR_ACTION_ID: &str = "urn:oasis:names:tc:xacml:1.0:action:action-id";
pub const ATTR_CURRENT_TIME: &str = "urn:oasis:names:tc:xacml:1.0:environment:current-time";
pub const ATTR_CURRENT_DATE: &str = "urn:oasis:names:tc:xacml:1.0:environment:current-date";
pub const ATTR_CURRENT_DATE_TIME: &str =
    "urn:oasis:names:tc:xacml:1.0:environment:current-dateTime";

// Subject categories
pub const SUBJECT_CATEGORY_ACCESS_SUBJECT: &str =
    "urn:oasis:names:tc:xacml:1.0:subject-category:access-subject";
