use crate::apis::Pagination;
use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize, Serializer};

/// Default number of transactions returned per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Filters for listing transactions.
///
/// The page size travels in the query string, every other field in the JSON body.
///
/// ```rust
/// # use mypos_rust::apis::transactions::{ListTransactionsRequestBuilder, TransactionType};
/// let request = ListTransactionsRequestBuilder::default()
///     .size(50u32)
///     .transaction_types(vec![TransactionType::PosPurchase, TransactionType::Refund])
///     .build()
///     .unwrap();
///
/// assert_eq!(request.size, 50);
/// assert!(request.from_date.is_none());
/// ```
#[derive(Serialize, Debug, Clone, Eq, PartialEq, Builder)]
#[builder(default)]
#[cfg_attr(not(feature = "compat"), non_exhaustive)]
pub struct ListTransactionsRequest {
    #[serde(skip)]
    pub size: u32,
    #[builder(setter(strip_option))]
    #[serde(
        serialize_with = "serialize_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub from_date: Option<DateTime<Utc>>,
    #[builder(setter(strip_option))]
    #[serde(
        serialize_with = "serialize_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub to_date: Option<DateTime<Utc>>,
    #[serde(
        serialize_with = "serialize_transaction_types",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub transaction_types: Vec<TransactionType>,
    #[builder(setter(into, strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign: Option<String>,
    #[builder(setter(into, strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transaction_id: Option<String>,
}

impl Default for ListTransactionsRequest {
    fn default() -> Self {
        Self {
            size: DEFAULT_PAGE_SIZE,
            from_date: None,
            to_date: None,
            transaction_types: Vec::new(),
            sign: None,
            last_transaction_id: None,
        }
    }
}

/// Type of a transaction, identified by a three digits code.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(not(feature = "compat"), non_exhaustive)]
pub enum TransactionType {
    #[serde(rename = "001")]
    Fee,
    #[serde(rename = "002")]
    CashWithdrawal,
    #[serde(rename = "003")]
    OutgoingBankTransfer,
    #[serde(rename = "004")]
    BalanceTransfer,
    #[serde(rename = "005")]
    EMoneyRedemption,
    #[serde(rename = "006")]
    AccountFunding,
    #[serde(rename = "007")]
    OriginalCredit,
    #[serde(rename = "008")]
    PosPurchase,
    #[serde(rename = "009")]
    OnlinePurchase,
    #[serde(rename = "010")]
    InternalTransfer,
    #[serde(rename = "011")]
    Refund,
    #[serde(rename = "012")]
    MoneyRequest,
    #[serde(rename = "013")]
    Payment,
    #[serde(rename = "014")]
    DirectDebit,
    #[serde(rename = "015")]
    PreAuthorization,
    #[serde(rename = "016")]
    MotoPayment,
    #[serde(rename = "017")]
    MotoRefund,
    #[serde(rename = "018")]
    MotoPreAuthorization,
    #[serde(rename = "019")]
    AtmDeposit,
    #[serde(rename = "022")]
    NfcPayment,
    #[serde(rename = "023")]
    AtmSurcharge,
    #[serde(rename = "024")]
    Withdrawal,
    #[serde(rename = "026")]
    UtilityBills,
    #[serde(rename = "035")]
    PaymentRequest,
    #[serde(rename = "036")]
    PaymentReturn,
    #[serde(rename = "037")]
    ReverseWithHold,
    #[serde(rename = "038")]
    ReverseRelease,
    #[serde(rename = "039")]
    Commission,
    #[serde(rename = "040")]
    CashFunding,
    #[serde(rename = "041")]
    NegativeSetOff,
    #[serde(rename = "042")]
    ChargeBack,
    #[serde(rename = "501")]
    PaymentOnPos,
}

impl TransactionType {
    /// Wire code of this transaction type.
    pub fn code(&self) -> &'static str {
        match self {
            TransactionType::Fee => "001",
            TransactionType::CashWithdrawal => "002",
            TransactionType::OutgoingBankTransfer => "003",
            TransactionType::BalanceTransfer => "004",
            TransactionType::EMoneyRedemption => "005",
            TransactionType::AccountFunding => "006",
            TransactionType::OriginalCredit => "007",
            TransactionType::PosPurchase => "008",
            TransactionType::OnlinePurchase => "009",
            TransactionType::InternalTransfer => "010",
            TransactionType::Refund => "011",
            TransactionType::MoneyRequest => "012",
            TransactionType::Payment => "013",
            TransactionType::DirectDebit => "014",
            TransactionType::PreAuthorization => "015",
            TransactionType::MotoPayment => "016",
            TransactionType::MotoRefund => "017",
            TransactionType::MotoPreAuthorization => "018",
            TransactionType::AtmDeposit => "019",
            TransactionType::NfcPayment => "022",
            TransactionType::AtmSurcharge => "023",
            TransactionType::Withdrawal => "024",
            TransactionType::UtilityBills => "026",
            TransactionType::PaymentRequest => "035",
            TransactionType::PaymentReturn => "036",
            TransactionType::ReverseWithHold => "037",
            TransactionType::ReverseRelease => "038",
            TransactionType::Commission => "039",
            TransactionType::CashFunding => "040",
            TransactionType::NegativeSetOff => "041",
            TransactionType::ChargeBack => "042",
            TransactionType::PaymentOnPos => "501",
        }
    }
}

/// Kind of reference number attached to a POS transaction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum ReferenceNumberType {
    ReferenceNumber,
    InvoiceNumber,
    ProductId,
    ReservationNumber,
}

impl TryFrom<u8> for ReferenceNumberType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ReferenceNumberType::ReferenceNumber),
            2 => Ok(ReferenceNumberType::InvoiceNumber),
            3 => Ok(ReferenceNumberType::ProductId),
            4 => Ok(ReferenceNumberType::ReservationNumber),
            other => Err(format!("Unknown reference number type: {}", other)),
        }
    }
}

impl From<ReferenceNumberType> for u8 {
    fn from(value: ReferenceNumberType) -> Self {
        match value {
            ReferenceNumberType::ReferenceNumber => 1,
            ReferenceNumberType::InvoiceNumber => 2,
            ReferenceNumberType::ProductId => 3,
            ReferenceNumberType::ReservationNumber => 4,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    #[serde(default)]
    pub id: Option<u64>,
    pub payment_reference: String,
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
    pub transaction_amount: f64,
    pub transaction_currency: String,
    pub original_amount: f64,
    pub original_currency: String,
    /// `C` for credit or `D` for debit.
    pub sign: String,
    pub date: String,
    #[serde(default)]
    pub operation_type: Option<String>,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub reference_number_type: Option<ReferenceNumberType>,
    #[serde(default)]
    pub terminal_id: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub ruid: Option<String>,
    #[serde(default)]
    pub billing_descriptor: Option<String>,
    /// Last four digits of the card number.
    #[serde(default)]
    pub pan: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionList {
    pub transactions: Vec<Transaction>,
    pub pagination: Pagination,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct TransactionDetail {
    pub label: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct TransactionDetails {
    pub details: Vec<TransactionDetail>,
}

fn serialize_date<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(date) => serializer.serialize_str(&date.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        None => serializer.serialize_none(),
    }
}

fn serialize_transaction_types<S>(
    types: &[TransactionType],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let codes = types
        .iter()
        .map(TransactionType::code)
        .collect::<Vec<_>>()
        .join(",");
    serializer.serialize_str(&codes)
}
