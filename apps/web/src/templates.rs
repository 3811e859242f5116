/// Render the single-page front end. Prices refresh every 10s and news every 30s.
pub fn render_index(watchlist: &[String], version: &str) -> String {
    let buttons: String = watchlist
        .iter()
        .map(|sym| {
            let sym = html_escape(sym);
            format!(r#"<button type="button" class="chip" data-symbol="{sym}">{sym}</button>"#)
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    PAGE.replace("{{WATCHLIST_BUTTONS}}", &buttons)
        .replace("{{VERSION}}", &html_escape(version))
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Trading Buddy</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 0; background: #f5f6f8; color: #222; }
  header { background: #14213d; color: #fff; padding: 14px 24px; display: flex; justify-content: space-between; align-items: center; }
  header small { opacity: .7; }
  main { max-width: 920px; margin: 0 auto; padding: 20px; }
  .ticker { display: flex; gap: 10px; flex-wrap: wrap; margin-bottom: 18px; }
  .tick { background: #fff; border-radius: 6px; padding: 8px 12px; min-width: 120px; box-shadow: 0 1px 2px rgba(0,0,0,.08); }
  .tick b { display: block; }
  .up { color: #2e7d32; } .down { color: #c62828; }
  form { display: flex; gap: 8px; }
  input[type=text] { flex: 1; padding: 10px; border: 1px solid #ccc; border-radius: 6px; font-size: 15px; }
  button { padding: 10px 14px; border: 0; border-radius: 6px; background: #fca311; cursor: pointer; font-weight: 600; }
  .chips { margin: 10px 0 18px; display: flex; gap: 6px; flex-wrap: wrap; }
  .chip { background: #e5e5e5; padding: 6px 10px; font-weight: 500; }
  .card { background: #fff; border-radius: 8px; padding: 16px; margin-bottom: 16px; box-shadow: 0 1px 3px rgba(0,0,0,.08); }
  .analysis { white-space: pre-line; line-height: 1.5; }
  .news-item { border-top: 1px solid #eee; padding: 10px 0; }
  .tag { font-size: 11px; font-weight: 700; padding: 2px 6px; border-radius: 4px; margin-left: 6px; }
  .Positive { background: #e8f5e9; color: #2e7d32; }
  .Negative { background: #ffebee; color: #c62828; }
  .Neutral { background: #eceff1; color: #546e7a; }
  .muted { color: #888; font-size: 13px; }
  .error { color: #c62828; }
</style>
</head>
<body>
<header>
  <strong>Trading Buddy</strong>
  <small>{{VERSION}}</small>
</header>
<main>
  <div id="ticker" class="ticker"><span class="muted">Loading prices...</span></div>

  <form id="ask">
    <input id="question" type="text" placeholder="Why is TSLA moving today?" autocomplete="off">
    <button type="submit">Ask</button>
  </form>
  <div class="chips">
        {{WATCHLIST_BUTTONS}}
  </div>

  <div id="result"></div>
  <div id="news"></div>
</main>
<script>
const PRICE_REFRESH_MS = 10000;
const NEWS_REFRESH_MS = 30000;
let currentSymbol = null;

function el(tag, cls, text) {
  const e = document.createElement(tag);
  if (cls) e.className = cls;
  if (text !== undefined) e.textContent = text;
  return e;
}

function newsEntry(item) {
  const row = el('div', 'news-item');
  const title = item.url ? el('a', null, item.title) : el('strong', null, item.title);
  if (item.url) { title.href = item.url; title.target = '_blank'; title.rel = 'noopener'; }
  row.appendChild(title);
  row.appendChild(el('span', 'tag ' + item.sentiment, item.sentiment));
  row.appendChild(el('div', 'muted', item.source || ''));
  row.appendChild(el('div', null, item.summary || ''));
  return row;
}

async function refreshPrices() {
  try {
    const res = await fetch('/api/quotes');
    const quotes = await res.json();
    const box = document.getElementById('ticker');
    box.replaceChildren();
    if (!quotes.length) { box.appendChild(el('span', 'muted', 'Waiting for first price update...')); return; }
    for (const q of quotes) {
      const t = el('div', 'tick');
      t.appendChild(el('b', null, q.symbol));
      t.appendChild(el('span', null, '$' + q.price.toFixed(2) + ' '));
      const pct = (q.change_percent >= 0 ? '+' : '') + q.change_percent.toFixed(2) + '%';
      t.appendChild(el('span', q.change_percent >= 0 ? 'up' : 'down', pct));
      box.appendChild(t);
    }
  } catch (e) { console.warn('price refresh failed', e); }
}

async function refreshNews() {
  if (!currentSymbol) return;
  const box = document.getElementById('news');
  try {
    const res = await fetch('/api/news/' + encodeURIComponent(currentSymbol));
    box.replaceChildren();
    if (!res.ok) return;
    const snap = await res.json();
    const card = el('div', 'card');
    card.appendChild(el('h3', null, 'Latest ' + snap.symbol + ' news'));
    card.appendChild(el('div', 'muted', 'via ' + snap.provider));
    snap.items.forEach(i => card.appendChild(newsEntry({
      title: i.headline, summary: i.summary, url: i.url, source: i.source, sentiment: i.sentiment,
    })));
    box.appendChild(card);
  } catch (e) { console.warn('news refresh failed', e); }
}

async function ask(question) {
  const box = document.getElementById('result');
  box.replaceChildren(el('div', 'muted', 'Analyzing...'));
  const res = await fetch('/analyze', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ question }),
  });
  const data = await res.json();
  box.replaceChildren();
  const card = el('div', 'card');
  if (!res.ok) {
    card.appendChild(el('div', 'error', data.error));
    if (data.suggestion) card.appendChild(el('div', 'muted', data.suggestion));
    box.appendChild(card);
    return;
  }
  currentSymbol = data.symbol;
  card.appendChild(el('h3', null, data.symbol + '  ' + data.current_price + '  (' + data.change_percent + ')'));
  card.appendChild(el('div', 'muted', 'Change ' + data.change + ' | Volume ' + data.volume + ' | ' + data.timestamp + ' | API ' + data.api_status));
  card.appendChild(el('p', 'analysis', data.analysis));
  data.news_items.forEach(i => card.appendChild(newsEntry(i)));
  box.appendChild(card);
  refreshNews();
}

document.getElementById('ask').addEventListener('submit', e => {
  e.preventDefault();
  const q = document.getElementById('question').value.trim();
  if (q) ask(q);
});

document.querySelectorAll('.chip').forEach(b => b.addEventListener('click', () => {
  const q = 'Why is ' + b.dataset.symbol + ' moving today?';
  document.getElementById('question').value = q;
  ask(q);
}));

refreshPrices();
setInterval(refreshPrices, PRICE_REFRESH_MS);
setInterval(refreshNews, NEWS_REFRESH_MS);
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html() {
        assert_eq!(
            html_escape(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }

    #[test]
    fn renders_watchlist_and_version() {
        let page = render_index(&["TSLA".into(), "<b>".into()], "v1.2");

        assert!(page.contains(r#"data-symbol="TSLA""#));
        assert!(page.contains("&lt;b&gt;"));
        assert!(page.contains("<small>v1.2</small>"));
        assert!(!page.contains("{{"));
    }
}
