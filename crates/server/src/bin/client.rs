use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Instant;

const BASE_URL: &str = "http://127.0.0.1:3000";
const PRODUCT_ID: i64 = 42;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateReviewRequest {
    rating: i64,
    review: String,
    user_name: String,
    element_id: i64,
    challenge_response: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    println!("Starting reviews test client...");

    println!("\n[1/4] Fetching PoW challenge...");
    let challenge_url = format!("{}/api/challenge", BASE_URL);
    let resp: Value = client.get(&challenge_url).send().await?.json().await?;

    let secret = resp["secret"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing secret"))?;
    let difficulty = resp["difficulty"]
        .as_u64()
        .ok_or_else(|| anyhow::anyhow!("Missing difficulty"))? as usize;
    println!("   -> Secret: {}", secret);
    println!("   -> Difficulty: {} leading zeros", difficulty);

    println!("\n[2/4] Mining (computing SHA256)...");
    let start = Instant::now();
    let (nonce, hash) = solve_pow(secret, difficulty);
    println!("   -> Nonce: {} Hash: {}", nonce, hash);
    println!("   -> Duration: {:.2?}", start.elapsed());

    println!("\n[3/4] Submitting review...");
    let payload = CreateReviewRequest {
        rating: 5,
        review: "Arrived quickly and works exactly as described.".to_string(),
        user_name: "Ferris".to_string(),
        element_id: PRODUCT_ID,
        challenge_response: format!("{}|{}", secret, nonce),
    };

    let post_url = format!("{}/api/reviews", BASE_URL);
    let resp = client.post(&post_url).json(&payload).send().await?;
    let status = resp.status();
    let body: Value = resp.json().await?;
    println!("   -> {} {}", status, body);
    if !status.is_success() {
        return Ok(());
    }

    println!("\n[4/4] Fetching listing and rating (new reviews await moderation)...");
    let list_url = format!("{}/api/reviews?productId={}", BASE_URL, PRODUCT_ID);
    let page: Value = client.get(&list_url).send().await?.json().await?;
    println!("   -> totalCount: {}", page["totalCount"]);
    if let Some(items) = page["items"].as_array() {
        for item in items {
            println!(
                "      - [{}] {} ({}): {}",
                item["formattedDate"], item["userName"], item["rating"], item["reviewText"]
            );
        }
    }

    let rating_url = format!("{}/api/products/{}/rating", BASE_URL, PRODUCT_ID);
    let rating: Value = client.get(&rating_url).send().await?.json().await?;
    println!("   -> rating: {}", rating);

    Ok(())
}

fn solve_pow(secret: &str, difficulty: usize) -> (u64, String) {
    let prefix = "0".repeat(difficulty);
    let mut nonce = 0u64;
    loop {
        let hash = hex::encode(Sha256::digest(format!("{}{}", secret, nonce)));
        if hash.starts_with(&prefix) {
            return (nonce, hash);
        }
        nonce += 1;
    }
}
