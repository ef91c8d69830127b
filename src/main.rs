use std::env;

use vectura::db::PgPool;
use vectura::engine::Engine;
use vectura::server::serve;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let db_uri = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let PgPool(pool) = PgPool::new(&db_uri, 5).await.unwrap();

    let engine = Engine::new(pool).await.unwrap();

    serve(engine).await;
}
