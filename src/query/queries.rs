/// 모든 상품 조회
pub const GET_ALL_ITEMS: &str = r#"
    SELECT id, auction_id, title, description, starting_price, current_price, reserve_price,
           current_winner_id, end_time, status, bid_count, created_at
    FROM items
    ORDER BY created_at DESC
"#;

/// 상품 조회
pub const GET_ITEM: &str = r#"
    SELECT id, auction_id, title, description, starting_price, current_price, reserve_price,
           current_winner_id, end_time, status, bid_count, created_at
    FROM items
    WHERE id = $1
"#;

/// 입찰 이력 조회 (최신순, 키셋 페이지네이션)
pub const GET_ITEM_BIDS: &str = r#"
    SELECT id, item_id, bidder_id, amount, kind, bid_time, is_winning
    FROM bids
    WHERE item_id = $1 AND ($2::BIGINT IS NULL OR id < $2)
    ORDER BY id DESC
    LIMIT $3
"#;

/// 상품 자동 입찰 조회 (비활성 포함, 감사 용도)
pub const GET_ITEM_PROXY_BIDS: &str = r#"
    SELECT id, item_id, bidder_id, max_amount, committed_amount, is_active, created_at
    FROM proxy_bids
    WHERE item_id = $1
    ORDER BY created_at
"#;

/// 경매 조회
pub const GET_AUCTION: &str = r#"
    SELECT id, title, status, start_time, end_time,
           anti_snipe_threshold_secs, anti_snipe_extension_secs, created_at
    FROM auctions
    WHERE id = $1
"#;

/// 경매 수동 개시 (SCHEDULED 상태에서만)
pub const OPEN_AUCTION: &str =
    "UPDATE auctions SET status = 'LIVE' WHERE id = $1 AND status = 'SCHEDULED'";
