/// 경매 저장
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (id, product_name, category, description, condition, status, timestamp)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

/// 경매 조회
pub const GET_AUCTION: &str =
    "SELECT id, product_name, category, description, condition, status, timestamp FROM auctions WHERE id = $1";

/// 만료 대상 경매 조회
pub const GET_ACTIVE_AUCTIONS_OLDER_THAN: &str = r#"
    SELECT id, product_name, category, description, condition, status, timestamp
    FROM auctions
    WHERE status = $1 AND timestamp <= $2
"#;

/// 경매 상태 조회 (행 잠금)
pub const GET_AUCTION_STATUS_FOR_UPDATE: &str =
    "SELECT status FROM auctions WHERE id = $1 FOR UPDATE";

/// 경매 상태 변경
pub const UPDATE_AUCTION_STATUS: &str = "UPDATE auctions SET status = $1 WHERE id = $2";
