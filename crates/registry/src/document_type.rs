//! The closed set of FpML document types accepted at the root of a message.
//!
//! Each [`DocumentType`] carries a static [`DocumentTypeDescriptor`]. Adding a
//! new root element means adding one variant and one row to [`DESCRIPTORS`];
//! nothing else in the workspace hard-codes element names.
use serde::{Deserialize, Serialize};

/// Immutable description of one supported root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeDescriptor {
    /// Local (namespace-stripped) name of the root element.
    pub element_name: &'static str,
    /// Human-readable description used in logs and findings.
    pub description: &'static str,
    /// Whether a `trade` element must appear somewhere in the document.
    pub requires_trade: bool,
}

/// Supported FpML root elements.
///
/// Serialized by element name so findings and logs carry the same spelling
/// senders use on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentType {
    // Core documents
    DataDocument,
    #[serde(rename = "FpML")]
    Fpml,

    // Confirmation and execution
    RequestConfirmation,
    ConfirmationAgreed,
    ExecutionNotification,
    ExecutionRetracted,

    // Statements
    DealStatement,
    OutstandingContractsStatement,
    FacilityPositionStatement,
    FacilityStatement,
    LoanPartyProfileStatement,
    LoanLegalActionStatement,

    // Notifications
    FacilityNotification,
    LcNotification,
    LoanAllocationNotification,
    LoanBulkServicingNotification,
    LoanContractNotification,
    LoanCovenantObligationNotification,
    LoanLegalActionNotification,
    LoanTradeNotification,

    // Acknowledgements and exceptions
    LoanNotificationAcknowledgement,
    LoanNotificationException,
    LoanNotificationRetracted,

    // Requests
    RequestClearing,
}

const fn descriptor(
    element_name: &'static str,
    description: &'static str,
    requires_trade: bool,
) -> DocumentTypeDescriptor {
    DocumentTypeDescriptor {
        element_name,
        description,
        requires_trade,
    }
}

/// Declaration-ordered table of every supported type and its descriptor.
pub(crate) const DESCRIPTORS: [(DocumentType, DocumentTypeDescriptor); 24] = [
    (
        DocumentType::DataDocument,
        descriptor("dataDocument", "Standard FpML data document", true),
    ),
    (
        DocumentType::Fpml,
        descriptor("FpML", "Generic FpML root element", true),
    ),
    (
        DocumentType::RequestConfirmation,
        descriptor("requestConfirmation", "Request for trade confirmation", true),
    ),
    (
        DocumentType::ConfirmationAgreed,
        descriptor("confirmationAgreed", "Confirmation agreement", true),
    ),
    (
        DocumentType::ExecutionNotification,
        descriptor("executionNotification", "Trade execution notification", true),
    ),
    (
        DocumentType::ExecutionRetracted,
        descriptor("executionRetracted", "Retraction of trade execution", true),
    ),
    (
        DocumentType::DealStatement,
        descriptor("dealStatement", "Deal statement document", false),
    ),
    (
        DocumentType::OutstandingContractsStatement,
        descriptor(
            "outstandingContractsStatement",
            "Outstanding contracts statement",
            false,
        ),
    ),
    (
        DocumentType::FacilityPositionStatement,
        descriptor("facilityPositionStatement", "Facility position statement", false),
    ),
    (
        DocumentType::FacilityStatement,
        descriptor("facilityStatement", "Facility statement", false),
    ),
    (
        DocumentType::LoanPartyProfileStatement,
        descriptor("loanPartyProfileStatement", "Loan party profile statement", false),
    ),
    (
        DocumentType::LoanLegalActionStatement,
        descriptor("loanLegalActionStatement", "Loan legal action statement", false),
    ),
    (
        DocumentType::FacilityNotification,
        descriptor("facilityNotification", "Facility notification", false),
    ),
    (
        DocumentType::LcNotification,
        descriptor("lcNotification", "Letter of credit notification", false),
    ),
    (
        DocumentType::LoanAllocationNotification,
        descriptor("loanAllocationNotification", "Loan allocation notification", false),
    ),
    (
        DocumentType::LoanBulkServicingNotification,
        descriptor(
            "loanBulkServicingNotification",
            "Loan bulk servicing notification",
            false,
        ),
    ),
    (
        DocumentType::LoanContractNotification,
        descriptor("loanContractNotification", "Loan contract notification", false),
    ),
    (
        DocumentType::LoanCovenantObligationNotification,
        descriptor(
            "loanCovenantObligationNotification",
            "Loan covenant obligation notification",
            false,
        ),
    ),
    (
        DocumentType::LoanLegalActionNotification,
        descriptor(
            "loanLegalActionNotification",
            "Loan legal action notification",
            false,
        ),
    ),
    (
        DocumentType::LoanTradeNotification,
        descriptor("loanTradeNotification", "Loan trade notification", false),
    ),
    (
        DocumentType::LoanNotificationAcknowledgement,
        descriptor(
            "loanNotificationAcknowledgement",
            "Loan notification acknowledgement",
            false,
        ),
    ),
    (
        DocumentType::LoanNotificationException,
        descriptor("loanNotificationException", "Loan notification exception", false),
    ),
    (
        DocumentType::LoanNotificationRetracted,
        descriptor("loanNotificationRetracted", "Loan notification retraction", false),
    ),
    (
        DocumentType::RequestClearing,
        descriptor("requestClearing", "Request for clearing", true),
    ),
];

impl DocumentType {
    /// Every supported type in declaration order.
    pub const ALL: [DocumentType; 24] = {
        let mut all = [DocumentType::DataDocument; 24];
        let mut i = 0;
        while i < DESCRIPTORS.len() {
            all[i] = DESCRIPTORS[i].0;
            i += 1;
        }
        all
    };

    /// Static descriptor for this type.
    pub fn descriptor(self) -> &'static DocumentTypeDescriptor {
        // DESCRIPTORS is declared in variant order.
        &DESCRIPTORS[self as usize].1
    }

    pub fn element_name(self) -> &'static str {
        self.descriptor().element_name
    }

    pub fn description(self) -> &'static str {
        self.descriptor().description
    }

    pub fn requires_trade(self) -> bool {
        self.descriptor().requires_trade
    }

    /// Resolve a root element local name. Matching is case-sensitive, as XML is.
    pub fn from_element_name(element_name: &str) -> Option<DocumentType> {
        crate::lookup_type(element_name)
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.element_name())
    }
}
